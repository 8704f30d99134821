//! Scoped ownership of off-screen surfaces
//!
//! [`OffscreenSurface`] is the only way the capture engine holds an
//! off-screen surface. Dropping the guard disposes the surface, so every exit
//! path (success, `?` on an error, unwinding) releases it.

use std::ops::{Deref, DerefMut};

use crate::viewport::{DisplaySize, RenderSurface, SurfaceError, SurfaceFactory};

pub struct OffscreenSurface {
    surface: Box<dyn RenderSurface>,
    size: DisplaySize,
}

impl OffscreenSurface {
    pub fn acquire(factory: &dyn SurfaceFactory, size: DisplaySize) -> Result<Self, SurfaceError> {
        let surface = factory.create_offscreen(size)?;
        Ok(Self { surface, size })
    }

    pub fn size(&self) -> DisplaySize {
        self.size
    }
}

impl Deref for OffscreenSurface {
    type Target = dyn RenderSurface;

    fn deref(&self) -> &Self::Target {
        self.surface.as_ref()
    }
}

impl DerefMut for OffscreenSurface {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.surface.as_mut()
    }
}

impl Drop for OffscreenSurface {
    fn drop(&mut self) {
        self.surface.dispose();
        tracing::trace!(size = %self.size, "released off-screen surface");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::RasterSurfaceFactory;

    #[test]
    fn test_guard_releases_on_drop() {
        let factory = RasterSurfaceFactory::new();
        {
            let guard = OffscreenSurface::acquire(&factory, DisplaySize::new(16, 9)).unwrap();
            assert_eq!(guard.backing_size(), DisplaySize::new(16, 9));
            assert_eq!(factory.live_surfaces(), 1);
        }
        assert_eq!(factory.live_surfaces(), 0);
    }

    #[test]
    fn test_failed_acquire_leaves_nothing_behind() {
        let factory = RasterSurfaceFactory::new();
        assert!(OffscreenSurface::acquire(&factory, DisplaySize::new(0, 0)).is_err());
        assert_eq!(factory.live_surfaces(), 0);
    }
}
