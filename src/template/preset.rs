//! Export resolution presets

use serde::{Deserialize, Serialize};

use crate::viewport::DisplaySize;

/// Named export resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPreset {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl ExportPreset {
    pub fn new(id: impl Into<String>, name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            width,
            height,
        }
    }

    pub fn resolution(&self) -> DisplaySize {
        DisplaySize::new(self.width, self.height)
    }

    /// Width over height. Infinite or NaN for a zero height.
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Built-in presets shipped with the engine
    pub fn builtin() -> Vec<ExportPreset> {
        vec![
            ExportPreset::new("hd-1080p", "HD 1080p", 1920, 1080),
            ExportPreset::new("square-2k", "Square 2K", 2048, 2048),
            ExportPreset::new("uhd-4k", "UHD 4K", 3840, 2160),
            ExportPreset::new("uhd-8k", "UHD 8K", 7680, 4320),
            ExportPreset::new("portrait-4x5", "Portrait 4:5", 1080, 1350),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_unique() {
        let presets = ExportPreset::builtin();
        for (i, a) in presets.iter().enumerate() {
            assert!(presets[i + 1..].iter().all(|b| b.id != a.id), "duplicate preset {}", a.id);
        }
    }

    #[test]
    fn test_aspect() {
        let hd = ExportPreset::new("hd", "HD", 1920, 1080);
        assert!((hd.aspect() - 16.0 / 9.0).abs() < 1e-6);
        assert!(!ExportPreset::new("bad", "Bad", 10, 0).aspect().is_finite());
    }
}
