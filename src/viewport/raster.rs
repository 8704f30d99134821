//! CPU reference surface
//!
//! Rasterizes flat-shaded triangles with a depth buffer into an RGBA frame.
//! Used for headless export and as the default surface provider of the CLI.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use glam::{Vec2, Vec3};
use image::{Rgba, RgbaImage};

use super::surface::{DisplaySize, RenderSurface, SurfaceError, SurfaceFactory};
use crate::rig::CameraState;
use crate::scene::{Mesh, RenderFlags, SceneProvider};

/// Largest edge accepted for an off-screen surface
pub const MAX_SURFACE_DIMENSION: u32 = 16_384;

/// Software-rendered surface
pub struct RasterSurface {
    size: DisplaySize,
    color: RgbaImage,
    depth: Vec<f32>,
    disposed: bool,
    /// Shared counter of the factory that created this surface
    live: Option<Arc<AtomicUsize>>,
}

impl RasterSurface {
    pub fn new(size: DisplaySize) -> Self {
        let mut surface = Self {
            size,
            color: RgbaImage::new(0, 0),
            depth: Vec::new(),
            disposed: false,
            live: None,
        };
        surface.allocate(size);
        surface
    }

    fn allocate(&mut self, size: DisplaySize) {
        let w = size.width.max(1);
        let h = size.height.max(1);
        self.size = DisplaySize::new(w, h);
        self.color = RgbaImage::new(w, h);
        self.depth = vec![f32::INFINITY; (w as usize) * (h as usize)];
    }

    fn to_screen(&self, ndc: Vec3) -> Vec3 {
        Vec3::new(
            (ndc.x * 0.5 + 0.5) * self.size.width as f32,
            (0.5 - ndc.y * 0.5) * self.size.height as f32,
            ndc.z,
        )
    }

    fn shade(mesh: &Mesh, normal: Vec3, camera: &CameraState, flags: &RenderFlags) -> Rgba<u8> {
        let intensity = if flags.shadows {
            let light = (-camera.forward() + camera.screen_up() * 0.6 + camera.right() * 0.3).normalize_or_zero();
            0.3 + 0.7 * normal.dot(light).abs()
        } else {
            1.0
        };
        let [r, g, b, a] = mesh.color;
        let lit = |c: u8| (c as f32 * intensity).round().clamp(0.0, 255.0) as u8;
        Rgba([lit(r), lit(g), lit(b), a])
    }

    fn fill_triangle(&mut self, tri: [Vec3; 3], color: Rgba<u8>) {
        let [a, b, c] = tri;
        let area = edge(a.truncate(), b.truncate(), c.truncate());
        if area.abs() < f32::EPSILON {
            return;
        }

        let (w, h) = (self.size.width as f32, self.size.height as f32);
        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
        let max_x = a.x.max(b.x).max(c.x).ceil().min(w) as u32;
        let max_y = a.y.max(b.y).max(c.y).ceil().min(h) as u32;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(b.truncate(), c.truncate(), p) / area;
                let w1 = edge(c.truncate(), a.truncate(), p) / area;
                let w2 = edge(a.truncate(), b.truncate(), p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let z = w0 * a.z + w1 * b.z + w2 * c.z;
                if !(0.0..=1.0).contains(&z) {
                    continue;
                }
                let idx = (y * self.size.width + x) as usize;
                if z < self.depth[idx] {
                    self.depth[idx] = z;
                    self.color.put_pixel(x, y, color);
                }
            }
        }
    }

    fn draw_line(&mut self, from: Vec3, to: Vec3, color: Rgba<u8>) {
        if !(0.0..=1.0).contains(&from.z) && !(0.0..=1.0).contains(&to.z) {
            return;
        }
        let delta = to.truncate() - from.truncate();
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let p = from.truncate() + delta * t;
            if p.x < 0.0 || p.y < 0.0 {
                continue;
            }
            let (x, y) = (p.x as u32, p.y as u32);
            if x < self.size.width && y < self.size.height {
                self.color.put_pixel(x, y, color);
            }
        }
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

impl RenderSurface for RasterSurface {
    fn backing_size(&self) -> DisplaySize {
        self.size
    }

    fn resize(&mut self, size: DisplaySize) {
        if self.disposed || size == self.size {
            return;
        }
        self.allocate(size);
    }

    fn render(&mut self, camera: &CameraState, scene: &dyn SceneProvider) -> Result<(), SurfaceError> {
        if self.disposed {
            return Err(SurfaceError::Disposed);
        }

        let flags = scene.flags();
        let background = Rgba(flags.background.rgba());
        for px in self.color.pixels_mut() {
            *px = background;
        }
        self.depth.fill(f32::INFINITY);

        let view_proj = camera.view_projection_matrix();
        for mesh in scene.meshes() {
            for [a, b, c] in mesh.triangle_vertices() {
                let screen = [a, b, c].map(|v| self.to_screen(view_proj.project_point3(v)));
                if !screen.iter().all(|p| p.is_finite()) {
                    return Err(SurfaceError::Render(format!("non-finite vertex in mesh '{}'", mesh.name)));
                }
                if flags.wireframe {
                    let color = Rgba(mesh.color);
                    self.draw_line(screen[0], screen[1], color);
                    self.draw_line(screen[1], screen[2], color);
                    self.draw_line(screen[2], screen[0], color);
                } else {
                    let normal = (b - a).cross(c - a).normalize_or_zero();
                    let color = Self::shade(mesh, normal, camera, &flags);
                    self.fill_triangle(screen, color);
                }
            }
        }
        Ok(())
    }

    fn read_pixels(&self) -> Result<RgbaImage, SurfaceError> {
        if self.disposed {
            return Err(SurfaceError::Disposed);
        }
        Ok(self.color.clone())
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.color = RgbaImage::new(0, 0);
        self.depth = Vec::new();
    }
}

impl Drop for RasterSurface {
    fn drop(&mut self) {
        self.dispose();
        if let Some(live) = self.live.take() {
            live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Creates [`RasterSurface`]s and tracks how many are alive
#[derive(Debug, Clone, Default)]
pub struct RasterSurfaceFactory {
    live: Arc<AtomicUsize>,
}

impl RasterSurfaceFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SurfaceFactory for RasterSurfaceFactory {
    fn create_offscreen(&self, size: DisplaySize) -> Result<Box<dyn RenderSurface>, SurfaceError> {
        if size.is_empty() || size.width > MAX_SURFACE_DIMENSION || size.height > MAX_SURFACE_DIMENSION {
            return Err(SurfaceError::Allocation(format!("unsupported off-screen size {}", size)));
        }
        let mut surface = RasterSurface::new(size);
        self.live.fetch_add(1, Ordering::SeqCst);
        surface.live = Some(Arc::clone(&self.live));
        tracing::debug!(%size, "allocated off-screen surface");
        Ok(Box::new(surface))
    }

    fn live_surfaces(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}
