//! Drawable surface boundary and per-view size descriptors

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::encode::{encode_rgba, ImageFormat};
use crate::rig::CameraState;
use crate::scene::SceneProvider;

/// Minimum render scale multiplier
pub const MIN_RENDER_SCALE: f32 = 0.25;
/// Maximum render scale multiplier
pub const MAX_RENDER_SCALE: f32 = 4.0;

/// Width/height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

impl DisplaySize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height; 1.0 for an empty size so cameras stay valid
    pub fn aspect(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Largest centred box of `aspect` that fits inside this size
    pub fn fit_aspect(&self, aspect: f32) -> DisplaySize {
        if self.is_empty() || !(aspect.is_finite() && aspect > 0.0) {
            return *self;
        }
        let (w, h) = (self.width as f32, self.height as f32);
        let (fw, fh) = if w / h > aspect { (h * aspect, h) } else { (w, w / aspect) };
        DisplaySize {
            width: (fw.round() as u32).clamp(1, self.width),
            height: (fh.round() as u32).clamp(1, self.height),
        }
    }

    pub fn scaled(&self, scale: f32) -> DisplaySize {
        DisplaySize {
            width: ((self.width as f32 * scale).round() as u32).max(1),
            height: ((self.height as f32 * scale).round() as u32).max(1),
        }
    }
}

impl std::fmt::Display for DisplaySize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Size state of one on-screen viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDescriptor {
    /// Box the layout gives the viewport
    pub natural_size: DisplaySize,
    /// Box actually shown; equals `natural_size` unless cropped for preview
    pub display_size: DisplaySize,
    /// Backing resolution multiplier
    pub render_scale: f32,
}

impl SurfaceDescriptor {
    pub fn new(natural_size: DisplaySize) -> Self {
        Self {
            natural_size,
            display_size: natural_size,
            render_scale: 1.0,
        }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.display_size.aspect()
    }

    /// Pixel size of the drawing buffer behind the displayed box
    pub fn backing_size(&self) -> DisplaySize {
        self.display_size.scaled(self.render_scale)
    }
}

/// Errors raised by surface implementations
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("render failed: {0}")]
    Render(String),
    #[error("encode failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("surface allocation failed: {0}")]
    Allocation(String),
    #[error("surface has been disposed")]
    Disposed,
}

/// A drawable target bound to one view
pub trait RenderSurface: Send {
    /// Pixel size of the drawing buffer
    fn backing_size(&self) -> DisplaySize;

    fn resize(&mut self, size: DisplaySize);

    fn render(&mut self, camera: &CameraState, scene: &dyn SceneProvider) -> Result<(), SurfaceError>;

    /// Copy of the last rendered frame
    fn read_pixels(&self) -> Result<RgbaImage, SurfaceError>;

    fn to_image_bytes(&self, format: ImageFormat, quality: u8) -> Result<Vec<u8>, SurfaceError> {
        let pixels = self.read_pixels()?;
        Ok(encode_rgba(&pixels, format, quality)?)
    }

    /// Release backing resources. Must be safe to call more than once.
    fn dispose(&mut self) {}
}

/// Creates disposable off-screen surfaces for export
pub trait SurfaceFactory: Send + Sync {
    fn create_offscreen(&self, size: DisplaySize) -> Result<Box<dyn RenderSurface>, SurfaceError>;

    /// Off-screen surfaces created by this factory that are still alive
    fn live_surfaces(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_aspect_letterboxes_wide_target() {
        let natural = DisplaySize::new(800, 800);
        let fitted = natural.fit_aspect(16.0 / 9.0);
        assert_eq!(fitted, DisplaySize::new(800, 450));
    }

    #[test]
    fn test_fit_aspect_pillarboxes_tall_target() {
        let natural = DisplaySize::new(1000, 500);
        let fitted = natural.fit_aspect(1.0);
        assert_eq!(fitted, DisplaySize::new(500, 500));
    }

    #[test]
    fn test_empty_size_aspect_is_one() {
        assert_eq!(DisplaySize::new(0, 300).aspect(), 1.0);
    }

    #[test]
    fn test_backing_size_applies_render_scale() {
        let mut desc = SurfaceDescriptor::new(DisplaySize::new(300, 200));
        desc.render_scale = 2.0;
        assert_eq!(desc.backing_size(), DisplaySize::new(600, 400));
        assert!((desc.aspect_ratio() - 1.5).abs() < 1e-6);
    }
}
