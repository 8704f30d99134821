//! Reconciliation mode and the directives it sends to the surface layer

use std::fmt;

/// Process-wide aspect policy
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ReconciliationMode {
    /// Each camera follows its own viewport's aspect
    #[default]
    Adaptive,
    /// Every camera and viewport box is forced to the export aspect
    ExportPreview { target_aspect: f32, preset_id: String },
}

impl ReconciliationMode {
    pub fn is_preview(&self) -> bool {
        matches!(self, ReconciliationMode::ExportPreview { .. })
    }

    pub fn target_aspect(&self) -> Option<f32> {
        match self {
            ReconciliationMode::Adaptive => None,
            ReconciliationMode::ExportPreview { target_aspect, .. } => Some(*target_aspect),
        }
    }

    pub fn preset_id(&self) -> Option<&str> {
        match self {
            ReconciliationMode::Adaptive => None,
            ReconciliationMode::ExportPreview { preset_id, .. } => Some(preset_id),
        }
    }
}

impl fmt::Display for ReconciliationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconciliationMode::Adaptive => write!(f, "adaptive"),
            ReconciliationMode::ExportPreview { target_aspect, preset_id } => {
                write!(f, "export preview ({} @ {:.4})", preset_id, target_aspect)
            }
        }
    }
}

/// Instruction for the surface layer's displayed boxes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeDirective {
    /// Show the largest centred box of `aspect` inside each natural size
    Crop { aspect: f32 },
    /// Show each viewport at its natural size
    RestoreNatural,
}
