//! Viewport Export - Command Line Entry Point
//!
//! Renders the demo asset through six raster viewports and runs one
//! marketplace batch, writing the images and `manifest.json`.
//!
//! Usage:
//!   viewport-export --marketplace storefront-square --out renders --preview
//!   viewport-export --list

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::Mutex;

use viewport_export::batch::{BatchEvent, BatchOrchestrator, BatchPlan, CancelFlag, OrchestratorConfig};
use viewport_export::capture::CaptureEngine;
use viewport_export::rig::ViewDirection;
use viewport_export::scene::Scene;
use viewport_export::session::ExportContext;
use viewport_export::settings::ExportSettings;
use viewport_export::telemetry::{init_logging, LogConfig};
use viewport_export::template::TemplateLibrary;
use viewport_export::viewport::{RasterSurface, RasterSurfaceFactory};

/// Batch-render marketplace views of an asset
#[derive(Parser, Debug)]
#[command(name = "viewport-export")]
#[command(about = "Render the six standard views of an asset for a marketplace")]
struct Args {
    /// Marketplace template id
    #[arg(long, short = 'm', default_value = "generic")]
    marketplace: String,

    /// Override the template's export preset
    #[arg(long, short = 'p')]
    preset: Option<String>,

    /// Output directory (defaults to the settings value)
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,

    /// Settings XML file (defaults to the user config directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Extra presets and templates to merge, as XML
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Pin the viewports to the export aspect before rendering
    #[arg(long)]
    preview: bool,

    /// Asset name used in output filenames
    #[arg(long, short = 'a')]
    asset: Option<String>,

    /// List presets and marketplaces, then exit
    #[arg(long)]
    list: bool,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_config = LogConfig {
        file_enabled: args.log_file.is_some(),
        file_path: args.log_file.clone(),
        ..LogConfig::default()
    };
    // Keep the guard alive for the program duration
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    let settings = match &args.settings {
        Some(path) => ExportSettings::load_from_file(path)
            .with_context(|| format!("reading settings from {}", path.display()))?,
        None => ExportSettings::load(),
    };

    let mut library = TemplateLibrary::new();
    if let Some(path) = &args.templates {
        library
            .load_file(path)
            .with_context(|| format!("reading templates from {}", path.display()))?;
    }

    if args.list {
        for preset in library.presets() {
            println!("preset      {:<20} {}x{}  {}", preset.id, preset.width, preset.height, preset.name);
        }
        for template in library.marketplaces() {
            println!("marketplace {:<20} {:<12} {}", template.id, template.preset_id, template.name);
        }
        return Ok(());
    }

    let template = library.marketplace(&args.marketplace)?.clone();
    let preset_id = args.preset.clone().unwrap_or_else(|| template.preset_id.clone());
    let preset = library.preset(&preset_id)?.clone();
    let asset = args.asset.clone().unwrap_or_else(|| settings.asset_name.clone());
    let out_dir = args.out.clone().unwrap_or_else(|| PathBuf::from(&settings.output_dir));

    let mut ctx = ExportContext::with_library(Box::new(Scene::demo()), &settings, library);
    let viewport_size = settings.viewport_size();
    for view in ViewDirection::ALL {
        ctx.attach_viewport(view, Box::new(RasterSurface::new(viewport_size)), viewport_size);
    }
    ctx.frame_scene();
    if args.preview {
        ctx.enable_export_preview(&preset.id)?;
    } else {
        ctx.render_all();
    }

    let engine = CaptureEngine::new(Box::new(RasterSurfaceFactory::new())).with_epsilon(settings.aspect_epsilon);
    let (orchestrator, mut events) =
        BatchOrchestrator::new(Arc::new(Mutex::new(ctx)), engine, OrchestratorConfig::from(&settings));

    let reporter = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                BatchEvent::Progress {
                    stage,
                    job_id,
                    view,
                    percent,
                } => {
                    tracing::info!(?stage, job = ?job_id, view = ?view, "{:.0}%", percent);
                }
                BatchEvent::JobError { job_id, message } => {
                    tracing::warn!(job = %job_id, "{}", message);
                }
            }
        }
    });

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current job");
            on_interrupt.cancel();
        }
    });

    let plan = BatchPlan::from_template(&template, &preset, &asset);
    tracing::info!(
        marketplace = %template.id,
        preset = %preset.id,
        jobs = plan.jobs.len(),
        out = %out_dir.display(),
        "starting export"
    );
    let report = orchestrator.run_batch(&plan, &cancel).await?;
    drop(orchestrator);
    let _ = reporter.await;

    std::fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    for result in &report.results {
        if let Some(bytes) = result.bytes() {
            let path = out_dir.join(&result.job.filename);
            std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        }
    }
    let manifest_path = out_dir.join("manifest.json");
    std::fs::write(&manifest_path, report.manifest.to_json()?)
        .with_context(|| format!("writing {}", manifest_path.display()))?;

    let manifest = &report.manifest;
    for warning in &manifest.warnings {
        tracing::warn!("{}", warning);
    }
    for error in &manifest.errors {
        tracing::error!("{}", error);
    }
    tracing::info!(
        succeeded = manifest.succeeded,
        failed = manifest.failed,
        manifest = %manifest_path.display(),
        "export finished"
    );

    if !manifest.is_valid() {
        bail!("delivery is incomplete: {} validation error(s)", manifest.errors.len());
    }
    Ok(())
}
