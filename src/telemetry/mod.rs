//! Logging infrastructure
//!
//! Structured logging with tracing; console, file and JSON outputs.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogGuard};
