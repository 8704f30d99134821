//! Marketplace batch export
//!
//! Expands a template into jobs, runs them one at a time through the capture
//! engine and validates the result set.

pub mod cancel;
pub mod events;
pub mod job;
pub mod manifest;
pub mod orchestrator;

pub use cancel::{CancelFlag, CancelToken, NeverCancel};
pub use events::{BatchEvent, BatchStage};
pub use job::{expand_jobs, BatchPlan, ExportJob, JobId, JobKind};
pub use manifest::{BatchReport, JobResult, Manifest, ManifestEntry};
pub use orchestrator::{BatchError, BatchOrchestrator, OrchestratorConfig};
