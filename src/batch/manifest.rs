//! Batch results and the delivery manifest
//!
//! Validation keeps two signals apart: a required job type with no job in
//! the plan is an error, while a required job type whose jobs failed or never
//! ran is a warning.

use serde::{Deserialize, Serialize};

use super::job::{BatchPlan, ExportJob, JobKind};
use crate::capture::{CaptureError, CaptureOutput, CapturePath};
use crate::encode::ImageFormat;
use crate::rig::ViewDirection;
use crate::template::Requirement;
use crate::viewport::DisplaySize;

/// Outcome of one attempted job
#[derive(Debug)]
pub struct JobResult {
    pub job: ExportJob,
    pub outcome: Result<CaptureOutput, CaptureError>,
    pub timing_ms: u64,
}

impl JobResult {
    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.outcome.as_ref().ok().map(|out| out.bytes.as_slice())
    }

    pub fn error(&self) -> Option<&CaptureError> {
        self.outcome.as_ref().err()
    }
}

/// Everything a finished (or cancelled) batch produced
#[derive(Debug)]
pub struct BatchReport {
    pub results: Vec<JobResult>,
    pub manifest: Manifest,
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub job_id: u64,
    pub view: ViewDirection,
    pub kind: JobKind,
    pub resolution: DisplaySize,
    pub format: ImageFormat,
    pub filename: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub path: Option<CapturePath>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    pub timing_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub marketplace: Option<String>,
    pub asset: String,
    /// Jobs in the plan
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Planned jobs that never ran because the batch was cancelled
    pub skipped: usize,
    pub cancelled: bool,
    pub entries: Vec<ManifestEntry>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl Manifest {
    pub fn build(plan: &BatchPlan, results: &[JobResult], cancelled: bool) -> Self {
        let entries: Vec<ManifestEntry> = results.iter().map(entry).collect();
        let succeeded = results.iter().filter(|r| r.success()).count();
        let failed = results.len() - succeeded;

        let mut warnings = Vec::new();
        let mut errors = Vec::new();
        if cancelled {
            warnings.push(format!(
                "batch cancelled after {} of {} jobs",
                results.len(),
                plan.jobs.len()
            ));
        }

        let unplanned = unplanned_requirements(plan);
        for requirement in &unplanned {
            errors.push(format!("required {} is missing from the batch", requirement));
        }

        for requirement in plan.requirements.iter().filter(|r| !unplanned.contains(r)) {
            let planned = plan.jobs.iter().filter(|j| j.requirement() == *requirement).count();
            let attempted: Vec<&JobResult> = results
                .iter()
                .filter(|r| r.job.requirement() == *requirement)
                .collect();
            if attempted.iter().any(|r| r.success()) {
                continue;
            }
            if attempted.len() < planned {
                warnings.push(format!("required {} was not rendered before cancellation", requirement));
            } else {
                warnings.push(format!("every {} job failed", requirement));
            }
        }

        Self {
            marketplace: plan.marketplace_id.clone(),
            asset: plan.asset.clone(),
            total: plan.jobs.len(),
            succeeded,
            failed,
            skipped: plan.jobs.len().saturating_sub(results.len()),
            cancelled,
            entries,
            warnings,
            errors,
        }
    }

    /// No hard validation errors
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn entry(result: &JobResult) -> ManifestEntry {
    let job = &result.job;
    let (bytes, path, error) = match &result.outcome {
        Ok(out) => (Some(out.bytes.len()), Some(out.path), None),
        Err(e) => (None, None, Some(e.to_string())),
    };
    ManifestEntry {
        job_id: job.id.0,
        view: job.view,
        kind: job.kind,
        resolution: job.resolution,
        format: job.format,
        filename: job.filename.clone(),
        success: result.success(),
        bytes,
        path,
        error,
        timing_ms: result.timing_ms,
    }
}

/// Requirements that no job in `plan` can satisfy
pub fn unplanned_requirements(plan: &BatchPlan) -> Vec<Requirement> {
    plan.requirements
        .iter()
        .copied()
        .filter(|req| !plan.jobs.iter().any(|j| j.requirement() == *req))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::BackgroundSpec;

    fn view_job(view: ViewDirection) -> ExportJob {
        ExportJob::new(
            "a",
            view,
            JobKind::View,
            DisplaySize::new(4, 4),
            ImageFormat::Png,
            BackgroundSpec::WHITE,
        )
    }

    fn ok(job: ExportJob) -> JobResult {
        JobResult {
            outcome: Ok(CaptureOutput {
                bytes: vec![1, 2, 3],
                size: job.resolution,
                format: job.format,
                path: CapturePath::Quality,
            }),
            job,
            timing_ms: 1,
        }
    }

    fn failed(job: ExportJob) -> JobResult {
        JobResult {
            outcome: Err(CaptureError::NotFound(job.view)),
            job,
            timing_ms: 1,
        }
    }

    #[test]
    fn test_missing_view_is_hard_error() {
        let jobs: Vec<ExportJob> = ViewDirection::ALL[..5].iter().map(|v| view_job(*v)).collect();
        let plan = BatchPlan::new("a", jobs.clone());
        assert_eq!(unplanned_requirements(&plan), vec![Requirement::View(ViewDirection::Bottom)]);

        let results: Vec<JobResult> = jobs.into_iter().map(ok).collect();
        let manifest = Manifest::build(&plan, &results, false);
        assert!(!manifest.is_valid());
        assert_eq!(manifest.errors.len(), 1);
        assert!(manifest.errors[0].contains("bottom"));
    }

    #[test]
    fn test_failed_view_is_warning_only() {
        let jobs: Vec<ExportJob> = ViewDirection::ALL.iter().map(|v| view_job(*v)).collect();
        let plan = BatchPlan::new("a", jobs.clone());
        let results: Vec<JobResult> = jobs
            .into_iter()
            .enumerate()
            .map(|(i, j)| if i == 2 { failed(j) } else { ok(j) })
            .collect();

        let manifest = Manifest::build(&plan, &results, false);
        assert!(manifest.is_valid());
        assert_eq!((manifest.succeeded, manifest.failed), (5, 1));
        assert_eq!(manifest.warnings.len(), 1);
        assert!(manifest.entries[2].error.is_some());
    }

    #[test]
    fn test_manifest_json_shape() {
        let job = view_job(ViewDirection::Top);
        let plan = BatchPlan::new("a", vec![job.clone()]).with_requirements(Vec::new());
        let manifest = Manifest::build(&plan, &[ok(job)], false);
        let json = manifest.to_json().unwrap();
        assert!(json.contains("\"filename\": \"a_top_4x4.png\""));
        assert!(json.contains("\"kind\": {"));
        let back: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }
}
