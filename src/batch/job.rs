//! Export job definitions and template expansion

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::encode::ImageFormat;
use crate::rig::ViewDirection;
use crate::scene::{BackgroundSpec, FlagOverrides};
use crate::template::{ExportPreset, MarketplaceTemplate, Requirement};
use crate::viewport::DisplaySize;

/// Unique identifier for an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl JobId {
    /// Next id from a process-wide counter
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        JobId(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a job renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum JobKind {
    /// Shaded render of one view
    View,
    /// Wireframe render of one view
    Wireframe,
    /// One frame of an orbit around the front view
    Turntable { frame: u32, frames: u32 },
    /// All six views tiled into one image
    ContactSheet,
}

impl JobKind {
    /// Execution order bucket; lower runs first
    pub fn priority(&self) -> u8 {
        match self {
            JobKind::View => 0,
            JobKind::Wireframe => 1,
            JobKind::Turntable { .. } => 2,
            JobKind::ContactSheet => 3,
        }
    }
}

/// One unit of export work. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub id: JobId,
    pub view: ViewDirection,
    pub kind: JobKind,
    pub resolution: DisplaySize,
    pub format: ImageFormat,
    pub background: BackgroundSpec,
    pub priority: u8,
    pub filename: String,
}

impl ExportJob {
    pub fn new(
        asset: &str,
        view: ViewDirection,
        kind: JobKind,
        resolution: DisplaySize,
        format: ImageFormat,
        background: BackgroundSpec,
    ) -> Self {
        let filename = output_filename(asset, view, &kind, resolution, format);
        Self {
            id: JobId::new(),
            view,
            kind,
            resolution,
            format,
            background,
            priority: kind.priority(),
            filename,
        }
    }

    /// Render flags this job forces for the duration of its capture
    pub fn overrides(&self) -> FlagOverrides {
        let wireframe = matches!(self.kind, JobKind::Wireframe);
        FlagOverrides {
            background: Some(self.background),
            wireframe: Some(wireframe),
            shadows: if wireframe { Some(false) } else { None },
        }
    }

    /// Template requirement this job contributes to
    pub fn requirement(&self) -> Requirement {
        match self.kind {
            JobKind::View => Requirement::View(self.view),
            JobKind::Wireframe => Requirement::Wireframe,
            JobKind::Turntable { .. } => Requirement::Turntable,
            JobKind::ContactSheet => Requirement::ContactSheet,
        }
    }
}

/// Keep asset names filesystem-safe
pub fn sanitize_asset_name(asset: &str) -> String {
    let cleaned: String = asset
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "asset".to_string()
    } else {
        cleaned
    }
}

fn output_filename(asset: &str, view: ViewDirection, kind: &JobKind, res: DisplaySize, format: ImageFormat) -> String {
    let asset = sanitize_asset_name(asset);
    let ext = format.extension();
    match kind {
        JobKind::View => format!("{}_{}_{}x{}.{}", asset, view, res.width, res.height, ext),
        JobKind::Wireframe => format!("{}_{}_wireframe_{}x{}.{}", asset, view, res.width, res.height, ext),
        JobKind::Turntable { frame, .. } => format!("{}_turntable_{:03}.{}", asset, frame, ext),
        JobKind::ContactSheet => format!("{}_contact_sheet.{}", asset, ext),
    }
}

/// Jobs for one marketplace delivery, in execution order
pub fn expand_jobs(template: &MarketplaceTemplate, preset: &ExportPreset, asset: &str) -> Vec<ExportJob> {
    let resolution = preset.resolution();
    let job = |view, kind| ExportJob::new(asset, view, kind, resolution, template.format, template.background);

    let mut jobs: Vec<ExportJob> = ViewDirection::ALL.iter().map(|v| job(*v, JobKind::View)).collect();
    if template.wireframe_required {
        jobs.push(job(ViewDirection::Front, JobKind::Wireframe));
    }
    let frames = template.turntable_frames;
    for frame in 0..frames {
        jobs.push(job(ViewDirection::Front, JobKind::Turntable { frame, frames }));
    }
    if template.contact_sheet {
        jobs.push(job(ViewDirection::Front, JobKind::ContactSheet));
    }

    jobs.sort_by_key(|j| j.priority);
    jobs
}

/// Ordered job list plus what the finished set must contain
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub marketplace_id: Option<String>,
    pub asset: String,
    pub jobs: Vec<ExportJob>,
    pub requirements: Vec<Requirement>,
}

impl BatchPlan {
    /// Ad-hoc plan; only the six views are required
    pub fn new(asset: impl Into<String>, jobs: Vec<ExportJob>) -> Self {
        Self {
            marketplace_id: None,
            asset: asset.into(),
            jobs,
            requirements: ViewDirection::ALL.iter().map(|v| Requirement::View(*v)).collect(),
        }
    }

    pub fn from_template(template: &MarketplaceTemplate, preset: &ExportPreset, asset: &str) -> Self {
        Self {
            marketplace_id: Some(template.id.clone()),
            asset: asset.to_string(),
            jobs: expand_jobs(template, preset, asset),
            requirements: template.requirements(),
        }
    }

    pub fn with_requirements(mut self, requirements: Vec<Requirement>) -> Self {
        self.requirements = requirements;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset() -> ExportPreset {
        ExportPreset::new("hd-1080p", "HD 1080p", 1920, 1080)
    }

    #[test]
    fn test_generic_template_expands_to_six_views() {
        let template = MarketplaceTemplate::new("generic", "Generic", "hd-1080p");
        let jobs = expand_jobs(&template, &preset(), "chair");
        assert_eq!(jobs.len(), 6);
        assert!(jobs.iter().all(|j| j.kind == JobKind::View));
        assert_eq!(jobs[0].filename, "chair_front_1920x1080.png");
        assert_eq!(jobs[5].filename, "chair_bottom_1920x1080.png");
    }

    #[test]
    fn test_full_template_order_and_names() {
        let template = MarketplaceTemplate::new("full", "Full", "hd-1080p")
            .with_format(ImageFormat::Jpeg)
            .with_wireframe()
            .with_turntable(3)
            .with_contact_sheet();
        let jobs = expand_jobs(&template, &preset(), "old lamp");
        assert_eq!(jobs.len(), 6 + 1 + 3 + 1);
        assert!(jobs.windows(2).all(|w| w[0].priority <= w[1].priority));

        assert_eq!(jobs[6].filename, "old_lamp_front_wireframe_1920x1080.jpg");
        assert_eq!(jobs[7].filename, "old_lamp_turntable_000.jpg");
        assert_eq!(jobs[9].kind, JobKind::Turntable { frame: 2, frames: 3 });
        assert_eq!(jobs[10].filename, "old_lamp_contact_sheet.jpg");
    }

    #[test]
    fn test_job_ids_unique() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wireframe_overrides() {
        let job = ExportJob::new(
            "x",
            ViewDirection::Front,
            JobKind::Wireframe,
            DisplaySize::new(10, 10),
            ImageFormat::Png,
            BackgroundSpec::Transparent,
        );
        let overrides = job.overrides();
        assert_eq!(overrides.wireframe, Some(true));
        assert_eq!(overrides.shadows, Some(false));
        assert_eq!(overrides.background, Some(BackgroundSpec::Transparent));
        assert_eq!(job.requirement(), Requirement::Wireframe);
    }

    #[test]
    fn test_sanitize_asset_name() {
        assert_eq!(sanitize_asset_name("  "), "asset");
        assert_eq!(sanitize_asset_name("a/b c"), "a_b_c");
    }
}
