//! Export presets and marketplace templates (pure data)

pub mod library;
pub mod marketplace;
pub mod preset;

pub use library::{TemplateError, TemplateFile, TemplateLibrary};
pub use marketplace::{MarketplaceTemplate, Requirement};
pub use preset::ExportPreset;
