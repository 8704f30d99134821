//! Progress and error events emitted while a batch runs

use serde::Serialize;

use super::job::JobId;
use crate::rig::ViewDirection;

/// Point in the batch lifecycle a progress event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchStage {
    BatchStart,
    JobStart,
    JobComplete,
    BatchComplete,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BatchEvent {
    Progress {
        stage: BatchStage,
        job_id: Option<JobId>,
        view: Option<ViewDirection>,
        /// 0-100 over the whole batch
        percent: f32,
    },
    JobError {
        job_id: JobId,
        message: String,
    },
}
