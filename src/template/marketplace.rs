//! Marketplace delivery templates
//!
//! A template is pure data: which preset to render at, which format, and
//! which optional job types the marketplace requires.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::encode::ImageFormat;
use crate::rig::ViewDirection;
use crate::scene::BackgroundSpec;

/// Delivery requirements for one marketplace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceTemplate {
    pub id: String,
    pub name: String,
    #[serde(rename = "presetId")]
    pub preset_id: String,
    #[serde(default)]
    pub format: ImageFormat,
    #[serde(default = "default_background")]
    pub background: BackgroundSpec,
    #[serde(rename = "wireframeRequired", default)]
    pub wireframe_required: bool,
    /// Number of turntable frames; 0 disables the turntable
    #[serde(rename = "turntableFrames", default)]
    pub turntable_frames: u32,
    #[serde(rename = "contactSheet", default)]
    pub contact_sheet: bool,
}

fn default_background() -> BackgroundSpec {
    BackgroundSpec::WHITE
}

/// A job type a template insists on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    View(ViewDirection),
    Wireframe,
    Turntable,
    ContactSheet,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::View(view) => write!(f, "{} view", view),
            Requirement::Wireframe => write!(f, "wireframe"),
            Requirement::Turntable => write!(f, "turntable"),
            Requirement::ContactSheet => write!(f, "contact sheet"),
        }
    }
}

impl MarketplaceTemplate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, preset_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            preset_id: preset_id.into(),
            format: ImageFormat::Png,
            background: default_background(),
            wireframe_required: false,
            turntable_frames: 0,
            contact_sheet: false,
        }
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_background(mut self, background: BackgroundSpec) -> Self {
        self.background = background;
        self
    }

    pub fn with_wireframe(mut self) -> Self {
        self.wireframe_required = true;
        self
    }

    pub fn with_turntable(mut self, frames: u32) -> Self {
        self.turntable_frames = frames;
        self
    }

    pub fn with_contact_sheet(mut self) -> Self {
        self.contact_sheet = true;
        self
    }

    /// Every job type the delivered set must contain
    pub fn requirements(&self) -> Vec<Requirement> {
        let mut required: Vec<Requirement> = ViewDirection::ALL.iter().map(|v| Requirement::View(*v)).collect();
        if self.wireframe_required {
            required.push(Requirement::Wireframe);
        }
        if self.turntable_frames > 0 {
            required.push(Requirement::Turntable);
        }
        if self.contact_sheet {
            required.push(Requirement::ContactSheet);
        }
        required
    }

    pub fn builtin() -> Vec<MarketplaceTemplate> {
        vec![
            MarketplaceTemplate::new("generic", "Generic Six-View", "hd-1080p"),
            MarketplaceTemplate::new("storefront-square", "Square Storefront", "square-2k")
                .with_format(ImageFormat::Jpeg)
                .with_wireframe()
                .with_contact_sheet(),
            MarketplaceTemplate::new("storefront-wide", "Widescreen Storefront", "uhd-4k")
                .with_wireframe()
                .with_turntable(8),
            MarketplaceTemplate::new("showcase-turntable", "Transparent Showcase", "hd-1080p")
                .with_background(BackgroundSpec::Transparent)
                .with_turntable(12)
                .with_contact_sheet(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirements_always_include_six_views() {
        let generic = MarketplaceTemplate::new("g", "G", "hd-1080p");
        assert_eq!(generic.requirements().len(), 6);

        let full = generic.with_wireframe().with_turntable(4).with_contact_sheet();
        let req = full.requirements();
        assert_eq!(req.len(), 9);
        assert!(req.contains(&Requirement::Turntable));
    }

    #[test]
    fn test_template_json_defaults() {
        let json = r#"{"id":"x","name":"X","presetId":"hd-1080p"}"#;
        let template: MarketplaceTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(template.format, ImageFormat::Png);
        assert_eq!(template.background, BackgroundSpec::WHITE);
        assert!(!template.wireframe_required);
    }
}
