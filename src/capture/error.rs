//! Capture error taxonomy

use crate::rig::ViewDirection;
use crate::viewport::{DisplaySize, SurfaceError};

/// Coarse classification used by callers deciding how to report a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad resolution, unknown view name; nothing was touched
    InvalidInput,
    /// Surface or camera not initialized yet
    ResourceUnavailable,
    /// Render or encode failed after resources were acquired
    RenderFailure,
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("unknown view '{0}'")]
    UnknownView(String),
    #[error("invalid capture resolution {0}")]
    InvalidResolution(DisplaySize),
    #[error("invalid turntable frame {frame} of {frames}")]
    InvalidFrame { frame: u32, frames: u32 },
    #[error("no surface attached for the {0} view")]
    NotFound(ViewDirection),
    #[error("could not allocate off-screen surface: {0}")]
    Allocation(SurfaceError),
    #[error("render failed: {0}")]
    Render(SurfaceError),
    #[error("encode failed: {0}")]
    Encode(#[from] image::ImageError),
}

impl CaptureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptureError::UnknownView(_) | CaptureError::InvalidResolution(_) | CaptureError::InvalidFrame { .. } => {
                ErrorKind::InvalidInput
            }
            CaptureError::NotFound(_) | CaptureError::Allocation(_) => ErrorKind::ResourceUnavailable,
            CaptureError::Render(_) | CaptureError::Encode(_) => ErrorKind::RenderFailure,
        }
    }
}

impl From<SurfaceError> for CaptureError {
    fn from(err: SurfaceError) -> Self {
        match err {
            SurfaceError::Encode(e) => CaptureError::Encode(e),
            SurfaceError::Allocation(_) => CaptureError::Allocation(err),
            other => CaptureError::Render(other),
        }
    }
}
