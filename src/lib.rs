//! Viewport Export Library
//!
//! Six synchronized orthographic views of one asset, a WYSIWYG export
//! preview that pins every camera to the export aspect, a dual-path capture
//! pipeline and a sequential marketplace batch orchestrator.

pub mod batch;
pub mod capture;
pub mod encode;
pub mod reconcile;
pub mod rig;
pub mod scene;
pub mod session;
pub mod settings;
pub mod telemetry;
pub mod template;
pub mod viewport;

pub use batch::{BatchEvent, BatchOrchestrator, BatchPlan, BatchReport, ExportJob, JobKind, Manifest};
pub use capture::{CaptureEngine, CaptureError, CaptureOptions, CaptureOutput, CapturePath};
pub use encode::ImageFormat;
pub use reconcile::{ReconcileError, ReconciliationController, ReconciliationMode};
pub use rig::{Aabb, CameraState, OrbitRig, ViewDirection};
pub use scene::{BackgroundSpec, Mesh, RenderFlags, Scene, SceneProvider};
pub use session::ExportContext;
pub use settings::{ExportSettings, SettingsError};
pub use template::{ExportPreset, MarketplaceTemplate, TemplateLibrary};
pub use viewport::{DisplaySize, RasterSurface, RasterSurfaceFactory, RenderSurface, SurfaceFactory};
