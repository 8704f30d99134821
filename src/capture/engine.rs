//! Dual-path capture
//!
//! The fast path reads back the live surface when the preview already shows
//! the export aspect. Everything else renders once into a disposable
//! off-screen surface with a camera clone built for the export aspect, so the
//! live camera and surface are never touched.

use std::f32::consts::TAU;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use super::error::CaptureError;
use super::offscreen::OffscreenSurface;
use crate::encode::{encode_rgba, ImageFormat};
use crate::reconcile::DEFAULT_ASPECT_EPSILON;
use crate::rig::{CameraState, ViewDirection};
use crate::scene::{FlagOverrides, SceneProvider, ScopedFlags};
use crate::session::ExportContext;
use crate::viewport::{DisplaySize, SurfaceFactory};

/// Contact sheet grid
pub const CONTACT_SHEET_COLUMNS: u32 = 3;
pub const CONTACT_SHEET_ROWS: u32 = 2;

/// Which route produced a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapturePath {
    /// Read back from the aspect-matched live surface
    Fast,
    /// Rendered into a disposable off-screen surface
    Quality,
}

/// Per-capture encoding and transient flag overrides
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    pub format: ImageFormat,
    /// JPEG quality (1-100)
    pub quality: u8,
    pub overrides: FlagOverrides,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            quality: 92,
            overrides: FlagOverrides::default(),
        }
    }
}

/// Encoded image plus where it came from
#[derive(Debug, Clone)]
pub struct CaptureOutput {
    pub bytes: Vec<u8>,
    pub size: DisplaySize,
    pub format: ImageFormat,
    pub path: CapturePath,
}

pub struct CaptureEngine {
    factory: Box<dyn SurfaceFactory>,
    epsilon: f32,
}

impl CaptureEngine {
    pub fn new(factory: Box<dyn SurfaceFactory>) -> Self {
        Self {
            factory,
            epsilon: DEFAULT_ASPECT_EPSILON,
        }
    }

    /// Tolerance when deciding whether a resolution matches the preview
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        if epsilon.is_finite() && epsilon > 0.0 {
            self.epsilon = epsilon;
        }
        self
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Off-screen surfaces currently alive; zero whenever no capture runs
    pub fn live_offscreen(&self) -> usize {
        self.factory.live_surfaces()
    }

    /// Capture `view_name` (e.g. "front") at `resolution`
    pub fn capture_named(
        &self,
        ctx: &mut ExportContext,
        view_name: &str,
        resolution: DisplaySize,
        options: &CaptureOptions,
    ) -> Result<CaptureOutput, CaptureError> {
        let view = ViewDirection::from_str(view_name).map_err(|e| CaptureError::UnknownView(e.0))?;
        self.capture(ctx, view, resolution, options)
    }

    /// Capture one view at exactly `resolution`
    pub fn capture(
        &self,
        ctx: &mut ExportContext,
        view: ViewDirection,
        resolution: DisplaySize,
        options: &CaptureOptions,
    ) -> Result<CaptureOutput, CaptureError> {
        if resolution.is_empty() {
            return Err(CaptureError::InvalidResolution(resolution));
        }
        if !ctx.viewports.has_surface(view) {
            return Err(CaptureError::NotFound(view));
        }

        if ctx.controller.matches_target(resolution.aspect(), self.epsilon) {
            tracing::debug!(view = %view, %resolution, "capturing from live surface");
            return self.capture_live(ctx, view, resolution, options);
        }

        tracing::debug!(view = %view, %resolution, "capturing off-screen");
        let camera = ctx.rig.camera(view).with_aspect(resolution.aspect());
        self.render_offscreen(&mut *ctx.scene, &camera, resolution, options)
    }

    /// Frame `frame` of an `frames`-step turntable around the front view
    pub fn capture_turntable_frame(
        &self,
        ctx: &mut ExportContext,
        frame: u32,
        frames: u32,
        resolution: DisplaySize,
        options: &CaptureOptions,
    ) -> Result<CaptureOutput, CaptureError> {
        if resolution.is_empty() {
            return Err(CaptureError::InvalidResolution(resolution));
        }
        if frames == 0 || frame >= frames {
            return Err(CaptureError::InvalidFrame { frame, frames });
        }
        if !ctx.viewports.has_surface(ViewDirection::Front) {
            return Err(CaptureError::NotFound(ViewDirection::Front));
        }

        let angle = TAU * frame as f32 / frames as f32;
        let camera = ctx
            .rig
            .camera(ViewDirection::Front)
            .with_aspect(resolution.aspect())
            .orbited(angle);
        self.render_offscreen(&mut *ctx.scene, &camera, resolution, options)
    }

    /// All six views tiled into one image of `resolution`
    pub fn capture_contact_sheet(
        &self,
        ctx: &mut ExportContext,
        resolution: DisplaySize,
        options: &CaptureOptions,
    ) -> Result<CaptureOutput, CaptureError> {
        if resolution.width < CONTACT_SHEET_COLUMNS || resolution.height < CONTACT_SHEET_ROWS {
            return Err(CaptureError::InvalidResolution(resolution));
        }
        if let Some(missing) = ViewDirection::ALL.into_iter().find(|v| !ctx.viewports.has_surface(*v)) {
            return Err(CaptureError::NotFound(missing));
        }

        let cell = DisplaySize::new(
            resolution.width / CONTACT_SHEET_COLUMNS,
            resolution.height / CONTACT_SHEET_ROWS,
        );
        let mut target = OffscreenSurface::acquire(self.factory.as_ref(), cell)?;
        let scoped = ScopedFlags::new(&mut *ctx.scene, &options.overrides);

        let background = Rgba(scoped.scene().flags().background.rgba());
        let mut sheet = RgbaImage::from_pixel(resolution.width, resolution.height, background);
        for (i, view) in ViewDirection::ALL.into_iter().enumerate() {
            let camera = ctx.rig.camera(view).with_aspect(cell.aspect());
            target.render(&camera, scoped.scene())?;
            let tile = target.read_pixels()?;
            let col = i as u32 % CONTACT_SHEET_COLUMNS;
            let row = i as u32 / CONTACT_SHEET_COLUMNS;
            imageops::overlay(&mut sheet, &tile, (col * cell.width) as i64, (row * cell.height) as i64);
        }
        drop(scoped);

        let bytes = encode_rgba(&sheet, options.format, options.quality)?;
        Ok(CaptureOutput {
            bytes,
            size: resolution,
            format: options.format,
            path: CapturePath::Quality,
        })
    }

    fn capture_live(
        &self,
        ctx: &mut ExportContext,
        view: ViewDirection,
        resolution: DisplaySize,
        options: &CaptureOptions,
    ) -> Result<CaptureOutput, CaptureError> {
        let camera = ctx.rig.camera(view);
        let surface = ctx.viewports.surface_mut(view).ok_or(CaptureError::NotFound(view))?;

        let pixels = {
            let scoped = ScopedFlags::new(&mut *ctx.scene, &options.overrides);
            surface.render(camera, scoped.scene())?;
            surface.read_pixels()?
        };

        // Put the unmodified frame back on screen
        if options.overrides != FlagOverrides::default() {
            if let Err(e) = surface.render(camera, &*ctx.scene) {
                tracing::warn!(view = %view, error = %e, "live surface repaint failed after capture");
            }
        }

        let pixels = if pixels.dimensions() == (resolution.width, resolution.height) {
            pixels
        } else {
            imageops::resize(&pixels, resolution.width, resolution.height, FilterType::Lanczos3)
        };
        let bytes = encode_rgba(&pixels, options.format, options.quality)?;
        Ok(CaptureOutput {
            bytes,
            size: resolution,
            format: options.format,
            path: CapturePath::Fast,
        })
    }

    fn render_offscreen(
        &self,
        scene: &mut dyn SceneProvider,
        camera: &CameraState,
        resolution: DisplaySize,
        options: &CaptureOptions,
    ) -> Result<CaptureOutput, CaptureError> {
        let mut target = OffscreenSurface::acquire(self.factory.as_ref(), resolution)?;
        let scoped = ScopedFlags::new(scene, &options.overrides);
        target.render(camera, scoped.scene())?;
        let bytes = target.to_image_bytes(options.format, options.quality)?;
        Ok(CaptureOutput {
            bytes,
            size: target.size(),
            format: options.format,
            path: CapturePath::Quality,
        })
    }
}
