//! Viewport/export aspect reconciliation

pub mod controller;
pub mod mode;

pub use controller::{ReconcileError, ReconciliationController, DEFAULT_ASPECT_EPSILON};
pub use mode::{ReconciliationMode, ResizeDirective};
