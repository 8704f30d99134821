//! Settings management for viewport export
//!
//! Handles loading/saving of the settings XML file. Every field has a serde
//! default so partial files load cleanly.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::{Deserialize, Serialize};

use crate::reconcile::DEFAULT_ASPECT_EPSILON;
use crate::rig::OrbitLimits;
use crate::viewport::DisplaySize;

/// Engine settings (stored in the config directory or passed on the CLI)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "ViewportExportSettings")]
pub struct ExportSettings {
    /// Distance and zoom clamp range for the orbit rig
    #[serde(rename = "orbitLimits", default)]
    pub orbit_limits: OrbitLimits,

    /// Tolerance when matching a capture resolution to the preview aspect
    #[serde(rename = "aspectEpsilon", default = "default_aspect_epsilon")]
    pub aspect_epsilon: f32,

    /// Pause between batch jobs so the viewer can repaint
    #[serde(rename = "interJobDelayMs", default = "default_inter_job_delay_ms")]
    pub inter_job_delay_ms: u64,

    /// How long a second batch waits for the running one before giving up
    #[serde(rename = "queueTimeoutMs", default = "default_queue_timeout_ms")]
    pub queue_timeout_ms: u64,

    /// Capacity of the progress event channel
    #[serde(rename = "eventCapacity", default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Where the CLI writes renders and the manifest
    #[serde(rename = "outputDir", default = "default_output_dir")]
    pub output_dir: String,

    /// Base name used in output filenames
    #[serde(rename = "assetName", default = "default_asset_name")]
    pub asset_name: String,

    /// JPEG quality (1-100)
    #[serde(rename = "jpegQuality", default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Natural size given to each on-screen viewport
    #[serde(rename = "viewportWidth", default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(rename = "viewportHeight", default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Render scale applied to every viewport
    #[serde(rename = "renderScale", default = "default_render_scale")]
    pub render_scale: f32,
}

fn default_aspect_epsilon() -> f32 {
    DEFAULT_ASPECT_EPSILON
}
fn default_inter_job_delay_ms() -> u64 {
    100
}
fn default_queue_timeout_ms() -> u64 {
    30_000
}
fn default_event_capacity() -> usize {
    64
}
fn default_output_dir() -> String {
    "renders".to_string()
}
fn default_asset_name() -> String {
    "asset".to_string()
}
fn default_jpeg_quality() -> u8 {
    92
}
fn default_viewport_width() -> u32 {
    480
}
fn default_viewport_height() -> u32 {
    360
}
fn default_render_scale() -> f32 {
    1.0
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            orbit_limits: OrbitLimits::default(),
            aspect_epsilon: default_aspect_epsilon(),
            inter_job_delay_ms: default_inter_job_delay_ms(),
            queue_timeout_ms: default_queue_timeout_ms(),
            event_capacity: default_event_capacity(),
            output_dir: default_output_dir(),
            asset_name: default_asset_name(),
            jpeg_quality: default_jpeg_quality(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            render_scale: default_render_scale(),
        }
    }
}

impl ExportSettings {
    /// Default settings file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("ViewportExport");
            p.push("settings.xml");
            p
        })
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from_file(&path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings file");
                Self::default()
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Self::from_xml(&contents)
    }

    pub fn from_xml(xml: &str) -> Result<Self, SettingsError> {
        let mut settings: Self = from_str(xml)?;
        settings.sanitize();
        Ok(settings)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        let xml = to_string(self)?;
        let formatted = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, formatted)?;
        Ok(())
    }

    /// Pull out-of-range values back to something usable
    pub fn sanitize(&mut self) {
        self.orbit_limits = self.orbit_limits.sanitized();
        if !(self.aspect_epsilon.is_finite() && self.aspect_epsilon > 0.0) {
            self.aspect_epsilon = default_aspect_epsilon();
        }
        self.event_capacity = self.event_capacity.max(1);
        self.jpeg_quality = self.jpeg_quality.clamp(1, 100);
        self.viewport_width = self.viewport_width.max(1);
        self.viewport_height = self.viewport_height.max(1);
        if !self.render_scale.is_finite() {
            self.render_scale = default_render_scale();
        }
    }

    pub fn viewport_size(&self) -> DisplaySize {
        DisplaySize::new(self.viewport_width, self.viewport_height)
    }

    pub fn inter_job_delay(&self) -> Duration {
        Duration::from_millis(self.inter_job_delay_ms)
    }

    pub fn queue_timeout(&self) -> Duration {
        Duration::from_millis(self.queue_timeout_ms)
    }
}

/// Errors that can occur when loading/saving settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::DeError),
    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::SeError),
}
