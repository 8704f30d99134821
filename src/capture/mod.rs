//! Image capture from live or off-screen surfaces

pub mod engine;
pub mod error;
pub mod offscreen;

pub use engine::{CaptureEngine, CaptureOptions, CaptureOutput, CapturePath};
pub use error::{CaptureError, ErrorKind};
pub use offscreen::OffscreenSurface;
