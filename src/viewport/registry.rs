//! Per-view surface registry
//!
//! Maps each view direction to its surface and size descriptor. The registry
//! knows nothing about cameras; the reconciliation controller reads aspect
//! ratios from here and pushes them into the rig.

use super::surface::{DisplaySize, RenderSurface, SurfaceDescriptor, MAX_RENDER_SCALE, MIN_RENDER_SCALE};
use crate::reconcile::ResizeDirective;
use crate::rig::ViewDirection;

struct ViewportSlot {
    descriptor: SurfaceDescriptor,
    surface: Option<Box<dyn RenderSurface>>,
}

impl ViewportSlot {
    fn sync_backing(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.resize(self.descriptor.backing_size());
        }
    }
}

/// Surfaces and descriptors for all six views
pub struct ViewportRegistry {
    slots: [ViewportSlot; 6],
}

impl ViewportRegistry {
    /// Empty registry; every view starts at `initial_size` with no surface
    pub fn new(initial_size: DisplaySize) -> Self {
        Self {
            slots: std::array::from_fn(|_| ViewportSlot {
                descriptor: SurfaceDescriptor::new(initial_size),
                surface: None,
            }),
        }
    }

    /// Bind a surface to `view`, replacing any previous one
    pub fn attach(&mut self, view: ViewDirection, surface: Box<dyn RenderSurface>, natural_size: DisplaySize) {
        let slot = &mut self.slots[view.index()];
        if let Some(mut old) = slot.surface.replace(surface) {
            old.dispose();
        }
        slot.descriptor.natural_size = natural_size;
        slot.descriptor.display_size = natural_size;
        slot.sync_backing();
        tracing::debug!(view = %view, size = %natural_size, "attached viewport surface");
    }

    /// Unbind and return the surface for `view`
    pub fn detach(&mut self, view: ViewDirection) -> Option<Box<dyn RenderSurface>> {
        self.slots[view.index()].surface.take()
    }

    pub fn descriptor(&self, view: ViewDirection) -> &SurfaceDescriptor {
        &self.slots[view.index()].descriptor
    }

    pub fn has_surface(&self, view: ViewDirection) -> bool {
        self.slots[view.index()].surface.is_some()
    }

    pub fn surface_mut(&mut self, view: ViewDirection) -> Option<&mut (dyn RenderSurface + 'static)> {
        self.slots[view.index()].surface.as_deref_mut()
    }

    /// Number of views with a bound surface
    pub fn attached_count(&self) -> usize {
        self.slots.iter().filter(|s| s.surface.is_some()).count()
    }

    /// Record a new natural size from a layout change.
    ///
    /// The displayed box follows the natural size; callers in preview mode
    /// re-apply the crop directive afterwards.
    pub fn resize(&mut self, view: ViewDirection, natural_size: DisplaySize) {
        let slot = &mut self.slots[view.index()];
        slot.descriptor.natural_size = natural_size;
        slot.descriptor.display_size = natural_size;
        slot.sync_backing();
    }

    /// Change the quality multiplier for `view`
    pub fn set_render_scale(&mut self, view: ViewDirection, scale: f32) {
        if !scale.is_finite() {
            return;
        }
        let slot = &mut self.slots[view.index()];
        slot.descriptor.render_scale = scale.clamp(MIN_RENDER_SCALE, MAX_RENDER_SCALE);
        slot.sync_backing();
    }

    /// Adopt a directive from the reconciliation controller for every view
    pub fn apply_directive(&mut self, directive: &ResizeDirective) {
        for slot in self.slots.iter_mut() {
            slot.descriptor.display_size = match directive {
                ResizeDirective::Crop { aspect } => slot.descriptor.natural_size.fit_aspect(*aspect),
                ResizeDirective::RestoreNatural => slot.descriptor.natural_size,
            };
            slot.sync_backing();
        }
    }
}

impl Drop for ViewportRegistry {
    fn drop(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Some(surface) = slot.surface.as_mut() {
                surface.dispose();
            }
        }
    }
}
