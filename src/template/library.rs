//! Lookup table of presets and marketplace templates
//!
//! Ships with built-in entries and can merge more from an XML file.

use std::fs;
use std::path::Path;

use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::{Deserialize, Serialize};

use super::marketplace::MarketplaceTemplate;
use super::preset::ExportPreset;

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATE FILE (on-disk XML shape)
// ═══════════════════════════════════════════════════════════════════════════════

/// Contents of a templates XML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "ViewportExportTemplates")]
pub struct TemplateFile {
    #[serde(rename = "preset", default)]
    pub presets: Vec<ExportPreset>,
    #[serde(rename = "marketplace", default)]
    pub marketplaces: Vec<MarketplaceTemplate>,
}

/// Errors loading or resolving templates
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::DeError),
    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::SeError),
    #[error("unknown export preset '{0}'")]
    UnknownPreset(String),
    #[error("unknown marketplace '{0}'")]
    UnknownMarketplace(String),
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPLATE LIBRARY
// ═══════════════════════════════════════════════════════════════════════════════

/// Presets and marketplace templates available to the session
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    presets: Vec<ExportPreset>,
    marketplaces: Vec<MarketplaceTemplate>,
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateLibrary {
    /// Library holding only the built-in entries
    pub fn new() -> Self {
        Self {
            presets: ExportPreset::builtin(),
            marketplaces: MarketplaceTemplate::builtin(),
        }
    }

    pub fn presets(&self) -> &[ExportPreset] {
        &self.presets
    }

    pub fn marketplaces(&self) -> &[MarketplaceTemplate] {
        &self.marketplaces
    }

    pub fn preset(&self, id: &str) -> Result<&ExportPreset, TemplateError> {
        self.presets
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| TemplateError::UnknownPreset(id.to_string()))
    }

    pub fn marketplace(&self, id: &str) -> Result<&MarketplaceTemplate, TemplateError> {
        self.marketplaces
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| TemplateError::UnknownMarketplace(id.to_string()))
    }

    /// Template together with the preset it renders at
    pub fn resolve(&self, marketplace_id: &str) -> Result<(&MarketplaceTemplate, &ExportPreset), TemplateError> {
        let template = self.marketplace(marketplace_id)?;
        let preset = self.preset(&template.preset_id)?;
        Ok((template, preset))
    }

    /// Insert or replace a preset by id
    pub fn add_preset(&mut self, preset: ExportPreset) {
        match self.presets.iter_mut().find(|p| p.id == preset.id) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    /// Insert or replace a marketplace template by id
    pub fn add_marketplace(&mut self, template: MarketplaceTemplate) {
        match self.marketplaces.iter_mut().find(|m| m.id == template.id) {
            Some(existing) => *existing = template,
            None => self.marketplaces.push(template),
        }
    }

    /// Merge entries from an XML string; later entries replace earlier ones
    pub fn merge_xml(&mut self, xml: &str) -> Result<usize, TemplateError> {
        let file: TemplateFile = from_str(xml)?;
        let count = file.presets.len() + file.marketplaces.len();
        for preset in file.presets {
            self.add_preset(preset);
        }
        for template in file.marketplaces {
            self.add_marketplace(template);
        }
        Ok(count)
    }

    /// Merge entries from an XML file on disk
    pub fn load_file(&mut self, path: &Path) -> Result<usize, TemplateError> {
        let contents = fs::read_to_string(path)?;
        let count = self.merge_xml(&contents)?;
        tracing::info!(path = %path.display(), count, "loaded export templates");
        Ok(count)
    }

    /// Serialize the whole library as XML
    pub fn to_xml(&self) -> Result<String, TemplateError> {
        let file = TemplateFile {
            presets: self.presets.clone(),
            marketplaces: self.marketplaces.clone(),
        };
        let xml = to_string(&file)?;
        Ok(format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml))
    }
}
