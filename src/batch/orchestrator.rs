//! Sequential batch execution
//!
//! Jobs run one at a time against the shared [`ExportContext`]. The context
//! lock is held only while a job renders, so the viewer can repaint during
//! the inter-job delay. A gate mutex keeps a second batch from interleaving
//! with one already in flight.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex};

use super::cancel::CancelToken;
use super::events::{BatchEvent, BatchStage};
use super::job::{BatchPlan, ExportJob, JobKind};
use super::manifest::{BatchReport, JobResult, Manifest};
use crate::capture::{CaptureEngine, CaptureError, CaptureOptions, CaptureOutput};
use crate::session::ExportContext;
use crate::settings::ExportSettings;

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Pause between jobs
    pub inter_job_delay: Duration,
    /// How long `run_batch` waits for an in-flight batch before giving up
    pub queue_timeout: Duration,
    pub jpeg_quality: u8,
    pub event_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&ExportSettings::default())
    }
}

impl From<&ExportSettings> for OrchestratorConfig {
    fn from(settings: &ExportSettings) -> Self {
        Self {
            inter_job_delay: settings.inter_job_delay(),
            queue_timeout: settings.queue_timeout(),
            jpeg_quality: settings.jpeg_quality,
            event_capacity: settings.event_capacity.max(1),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("another batch is still running after waiting {0:?}")]
    Busy(Duration),
}

pub struct BatchOrchestrator {
    ctx: Arc<Mutex<ExportContext>>,
    engine: CaptureEngine,
    config: OrchestratorConfig,
    gate: Mutex<()>,
    events: mpsc::Sender<BatchEvent>,
}

impl BatchOrchestrator {
    /// Create an orchestrator and the receiving end of its event channel.
    ///
    /// The channel is bounded; a batch waits for the receiver when it is
    /// full. Dropping the receiver is fine, events are then discarded.
    pub fn new(
        ctx: Arc<Mutex<ExportContext>>,
        engine: CaptureEngine,
        config: OrchestratorConfig,
    ) -> (Self, mpsc::Receiver<BatchEvent>) {
        let (events, rx) = mpsc::channel(config.event_capacity.max(1));
        let orchestrator = Self {
            ctx,
            engine,
            config,
            gate: Mutex::new(()),
            events,
        };
        (orchestrator, rx)
    }

    pub fn context(&self) -> Arc<Mutex<ExportContext>> {
        Arc::clone(&self.ctx)
    }

    pub fn engine(&self) -> &CaptureEngine {
        &self.engine
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Whether a batch currently holds the gate
    pub fn is_running(&self) -> bool {
        self.gate.try_lock().is_err()
    }

    /// Run every job in `plan` in order and assemble the manifest.
    ///
    /// A failing job is recorded and the batch moves on. Cancellation is
    /// checked between jobs; the job in flight always finishes.
    pub async fn run_batch(&self, plan: &BatchPlan, cancel: &dyn CancelToken) -> Result<BatchReport, BatchError> {
        let _gate = match tokio::time::timeout(self.config.queue_timeout, self.gate.lock()).await {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!(timeout = ?self.config.queue_timeout, "batch rejected, another batch is running");
                return Err(BatchError::Busy(self.config.queue_timeout));
            }
        };

        let total = plan.jobs.len();
        tracing::info!(jobs = total, marketplace = ?plan.marketplace_id, "batch started");
        self.emit(BatchEvent::Progress {
            stage: BatchStage::BatchStart,
            job_id: None,
            view: None,
            percent: 0.0,
        })
        .await;

        let mut results = Vec::with_capacity(total);
        let mut cancelled = false;
        for (index, job) in plan.jobs.iter().enumerate() {
            if index > 0 && !self.config.inter_job_delay.is_zero() {
                tokio::time::sleep(self.config.inter_job_delay).await;
            }
            if cancel.is_cancelled() {
                tracing::info!(completed = index, total, "batch cancelled");
                cancelled = true;
                break;
            }

            self.emit(BatchEvent::Progress {
                stage: BatchStage::JobStart,
                job_id: Some(job.id),
                view: Some(job.view),
                percent: percent(index, total),
            })
            .await;

            let started = Instant::now();
            let outcome = {
                let mut ctx = self.ctx.lock().await;
                self.execute(&mut ctx, job)
            };
            let timing_ms = started.elapsed().as_millis() as u64;

            match &outcome {
                Ok(output) => {
                    tracing::debug!(job = %job.id, file = %job.filename, bytes = output.bytes.len(), timing_ms, "job complete");
                    self.emit(BatchEvent::Progress {
                        stage: BatchStage::JobComplete,
                        job_id: Some(job.id),
                        view: Some(job.view),
                        percent: percent(index + 1, total),
                    })
                    .await;
                }
                Err(e) => {
                    tracing::warn!(job = %job.id, file = %job.filename, error = %e, "job failed");
                    self.emit(BatchEvent::JobError {
                        job_id: job.id,
                        message: e.to_string(),
                    })
                    .await;
                }
            }

            results.push(JobResult {
                job: job.clone(),
                outcome,
                timing_ms,
            });
        }

        let manifest = Manifest::build(plan, &results, cancelled);
        tracing::info!(
            succeeded = manifest.succeeded,
            failed = manifest.failed,
            warnings = manifest.warnings.len(),
            errors = manifest.errors.len(),
            "batch finished"
        );
        self.emit(BatchEvent::Progress {
            stage: BatchStage::BatchComplete,
            job_id: None,
            view: None,
            percent: 100.0,
        })
        .await;

        Ok(BatchReport {
            results,
            manifest,
            cancelled,
        })
    }

    fn execute(&self, ctx: &mut ExportContext, job: &ExportJob) -> Result<CaptureOutput, CaptureError> {
        let options = CaptureOptions {
            format: job.format,
            quality: self.config.jpeg_quality,
            overrides: job.overrides(),
        };
        match job.kind {
            JobKind::View | JobKind::Wireframe => self.engine.capture(ctx, job.view, job.resolution, &options),
            JobKind::Turntable { frame, frames } => {
                self.engine
                    .capture_turntable_frame(ctx, frame, frames, job.resolution, &options)
            }
            JobKind::ContactSheet => self.engine.capture_contact_sheet(ctx, job.resolution, &options),
        }
    }

    async fn emit(&self, event: BatchEvent) {
        let _ = self.events.send(event).await;
    }
}

fn percent(done: usize, total: usize) -> f32 {
    if total == 0 {
        100.0
    } else {
        done as f32 * 100.0 / total as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::batch::cancel::NeverCancel;
    use crate::rig::ViewDirection;
    use crate::scene::Scene;
    use crate::template::{ExportPreset, MarketplaceTemplate};
    use crate::viewport::{
        DisplaySize, RasterSurface, RasterSurfaceFactory, RenderSurface, SurfaceError, SurfaceFactory,
    };

    /// Raster factory whose n-th allocation (0-based) fails
    struct FailNthFactory {
        inner: RasterSurfaceFactory,
        calls: AtomicUsize,
        fail_on: usize,
    }

    impl SurfaceFactory for FailNthFactory {
        fn create_offscreen(&self, size: DisplaySize) -> Result<Box<dyn RenderSurface>, SurfaceError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_on {
                return Err(SurfaceError::Allocation("injected failure".into()));
            }
            self.inner.create_offscreen(size)
        }

        fn live_surfaces(&self) -> usize {
            self.inner.live_surfaces()
        }
    }

    fn shared_context() -> Arc<Mutex<ExportContext>> {
        let mut ctx = ExportContext::with_scene(Scene::demo());
        for view in ViewDirection::ALL {
            let size = DisplaySize::new(64, 48);
            ctx.attach_viewport(view, Box::new(RasterSurface::new(size)), size);
        }
        ctx.frame_scene();
        Arc::new(Mutex::new(ctx))
    }

    fn config(delay_ms: u64, timeout_ms: u64) -> OrchestratorConfig {
        OrchestratorConfig {
            inter_job_delay: Duration::from_millis(delay_ms),
            queue_timeout: Duration::from_millis(timeout_ms),
            jpeg_quality: 90,
            event_capacity: 256,
        }
    }

    fn six_view_plan() -> BatchPlan {
        let template = MarketplaceTemplate::new("t", "T", "small");
        let preset = ExportPreset::new("small", "Small", 32, 24);
        BatchPlan::from_template(&template, &preset, "unit")
    }

    #[tokio::test]
    async fn test_single_failure_does_not_abort_batch() {
        let factory = FailNthFactory {
            inner: RasterSurfaceFactory::new(),
            calls: AtomicUsize::new(0),
            fail_on: 2,
        };
        let engine = CaptureEngine::new(Box::new(factory));
        let (orchestrator, mut rx) = BatchOrchestrator::new(shared_context(), engine, config(0, 1000));

        let report = orchestrator.run_batch(&six_view_plan(), &NeverCancel).await.unwrap();
        assert_eq!(report.results.len(), 6);
        assert_eq!(report.results.iter().filter(|r| !r.success()).count(), 1);
        assert!(!report.results[2].success());
        assert!(report.manifest.is_valid());
        assert_eq!(report.manifest.failed, 1);
        assert_eq!(orchestrator.engine().live_offscreen(), 0);

        drop(orchestrator);
        let mut errors = 0;
        let mut last_percent = 0.0;
        while let Some(event) = rx.recv().await {
            match event {
                BatchEvent::JobError { .. } => errors += 1,
                BatchEvent::Progress { percent, .. } => {
                    assert!(percent >= last_percent);
                    last_percent = percent;
                }
            }
        }
        assert_eq!(errors, 1);
        assert_eq!(last_percent, 100.0);
    }

    #[tokio::test]
    async fn test_second_batch_times_out_while_first_runs() {
        let engine = CaptureEngine::new(Box::new(RasterSurfaceFactory::new()));
        let (orchestrator, _rx) = BatchOrchestrator::new(shared_context(), engine, config(20, 5));
        let plan = six_view_plan();

        let (first, second) = tokio::join!(
            orchestrator.run_batch(&plan, &NeverCancel),
            orchestrator.run_batch(&plan, &NeverCancel)
        );
        assert!(first.is_ok());
        assert!(matches!(second, Err(BatchError::Busy(_))));
        assert!(!orchestrator.is_running());
    }

    #[tokio::test]
    async fn test_cancellation_between_jobs() {
        let engine = CaptureEngine::new(Box::new(RasterSurfaceFactory::new()));
        let (orchestrator, _rx) = BatchOrchestrator::new(shared_context(), engine, config(0, 1000));
        let checks = AtomicUsize::new(0);
        let cancel_after_two = || checks.fetch_add(1, Ordering::SeqCst) >= 2;

        let report = orchestrator
            .run_batch(&six_view_plan(), &cancel_after_two)
            .await
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.manifest.skipped, 4);
        // Views that never ran are warnings, not missing jobs
        assert!(report.manifest.is_valid());
        assert_eq!(report.manifest.warnings.len(), 1 + 4);
    }

    #[tokio::test]
    async fn test_full_template_runs_every_kind() {
        let engine = CaptureEngine::new(Box::new(RasterSurfaceFactory::new()));
        let (orchestrator, _rx) = BatchOrchestrator::new(shared_context(), engine, config(0, 1000));
        let template = MarketplaceTemplate::new("full", "Full", "small")
            .with_wireframe()
            .with_turntable(2)
            .with_contact_sheet();
        let preset = ExportPreset::new("small", "Small", 30, 20);
        let plan = BatchPlan::from_template(&template, &preset, "unit");

        let report = orchestrator.run_batch(&plan, &NeverCancel).await.unwrap();
        assert_eq!(report.results.len(), 10);
        assert!(report.results.iter().all(|r| r.success()));
        assert!(report.manifest.is_valid());
        assert!(report.manifest.warnings.is_empty());
    }
}
