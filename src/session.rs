//! Export session context
//!
//! [`ExportContext`] owns the rig, the reconciliation controller, the
//! viewport registry, the scene and the template library. Every operation
//! goes through it so there is no hidden process-wide state.

use glam::Vec3;

use crate::reconcile::{ReconcileError, ReconciliationController, ResizeDirective};
use crate::rig::{OrbitLimits, OrbitRig, OrbitSnapshot, ViewDirection};
use crate::scene::SceneProvider;
use crate::settings::ExportSettings;
use crate::template::TemplateLibrary;
use crate::viewport::{DisplaySize, RenderSurface, ViewportRegistry};

/// Session state shared by the viewer and the export pipeline
pub struct ExportContext {
    pub(crate) rig: OrbitRig,
    pub(crate) controller: ReconciliationController,
    pub(crate) viewports: ViewportRegistry,
    pub(crate) scene: Box<dyn SceneProvider>,
    library: TemplateLibrary,
    render_scale: f32,
}

impl ExportContext {
    pub fn new(scene: Box<dyn SceneProvider>, settings: &ExportSettings) -> Self {
        Self::with_library(scene, settings, TemplateLibrary::new())
    }

    pub fn with_library(scene: Box<dyn SceneProvider>, settings: &ExportSettings, library: TemplateLibrary) -> Self {
        Self {
            rig: OrbitRig::new(settings.orbit_limits),
            controller: ReconciliationController::new(),
            viewports: ViewportRegistry::new(settings.viewport_size()),
            scene,
            library,
            render_scale: settings.render_scale,
        }
    }

    /// Context with default settings, the built-in templates and `scene`
    pub fn with_scene(scene: impl SceneProvider + 'static) -> Self {
        Self::new(Box::new(scene), &ExportSettings::default())
    }

    pub fn rig(&self) -> &OrbitRig {
        &self.rig
    }

    pub fn controller(&self) -> &ReconciliationController {
        &self.controller
    }

    pub fn viewports(&self) -> &ViewportRegistry {
        &self.viewports
    }

    pub fn scene(&self) -> &dyn SceneProvider {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> &mut dyn SceneProvider {
        self.scene.as_mut()
    }

    pub fn library(&self) -> &TemplateLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut TemplateLibrary {
        &mut self.library
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VIEWPORTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Bind an on-screen surface to `view` and bring it in line with the mode
    pub fn attach_viewport(&mut self, view: ViewDirection, surface: Box<dyn RenderSurface>, natural_size: DisplaySize) {
        self.viewports.attach(view, surface, natural_size);
        self.viewports.set_render_scale(view, self.render_scale);
        self.sync_layout();
    }

    pub fn detach_viewport(&mut self, view: ViewDirection) -> Option<Box<dyn RenderSurface>> {
        self.viewports.detach(view)
    }

    /// Layout change for one viewport
    pub fn resize_viewport(&mut self, view: ViewDirection, natural_size: DisplaySize) {
        self.viewports.resize(view, natural_size);
        self.sync_layout();
    }

    pub fn set_render_scale(&mut self, view: ViewDirection, scale: f32) {
        self.viewports.set_render_scale(view, scale);
    }

    /// Re-apply the active directive to every surface and reconcile aspects
    fn sync_layout(&mut self) {
        let directive = self.controller.current_directive();
        self.viewports.apply_directive(&directive);
        self.controller.reconcile(&self.viewports, &mut self.rig);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ORBIT
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn set_target(&mut self, target: Vec3) {
        self.rig.set_target(target);
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.rig.set_distance(distance);
    }

    pub fn set_zoom(&mut self, frustum_size: f32) {
        self.rig.set_zoom(frustum_size);
    }

    pub fn pan(&mut self, dx: f32, dy: f32, reference: ViewDirection) {
        self.rig.pan(dx, dy, reference);
    }

    /// Frame the scene's bounding box; returns false for an empty scene
    pub fn frame_scene(&mut self) -> bool {
        match self.scene.bounding_box() {
            Some(bounds) => {
                self.rig.frame_to_bounds(&bounds);
                true
            }
            None => false,
        }
    }

    pub fn reset_view(&mut self) {
        self.rig.reset();
    }

    pub fn orbit_limits(&self) -> &OrbitLimits {
        self.rig.limits()
    }

    pub fn snapshot(&self, view: ViewDirection) -> OrbitSnapshot {
        self.rig.snapshot(view)
    }

    pub fn restore(&mut self, snapshot: &OrbitSnapshot) {
        self.rig.restore(snapshot);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXPORT PREVIEW
    // ═══════════════════════════════════════════════════════════════════════════

    /// Enter export preview with the preset's aspect and re-render once
    pub fn enable_export_preview(&mut self, preset_id: &str) -> Result<(), ReconcileError> {
        let preset = self
            .library
            .preset(preset_id)
            .map_err(|_| ReconcileError::UnknownPreset(preset_id.to_string()))?;
        let directive = self.controller.enable(preset)?;
        self.apply_transition(directive);
        Ok(())
    }

    /// Switch the preview target without leaving preview
    pub fn change_export_preset(&mut self, preset_id: &str) -> Result<(), ReconcileError> {
        let preset = self
            .library
            .preset(preset_id)
            .map_err(|_| ReconcileError::UnknownPreset(preset_id.to_string()))?;
        let directive = self.controller.change_preset(preset)?;
        self.apply_transition(directive);
        Ok(())
    }

    /// Leave export preview; each view returns to its natural aspect
    pub fn disable_export_preview(&mut self) -> Result<(), ReconcileError> {
        let directive = self.controller.disable()?;
        self.apply_transition(directive);
        Ok(())
    }

    fn apply_transition(&mut self, directive: ResizeDirective) {
        self.viewports.apply_directive(&directive);
        self.controller.reconcile(&self.viewports, &mut self.rig);
        self.render_all();
    }

    /// Render every attached surface with its live camera.
    ///
    /// Returns the number of surfaces rendered successfully. Failures are
    /// logged; a broken viewport never blocks the others.
    pub fn render_all(&mut self) -> usize {
        let mut rendered = 0;
        for view in ViewDirection::ALL {
            let camera = self.rig.camera(view);
            let Some(surface) = self.viewports.surface_mut(view) else {
                continue;
            };
            match surface.render(camera, self.scene.as_ref()) {
                Ok(()) => rendered += 1,
                Err(e) => tracing::warn!(view = %view, error = %e, "viewport render failed"),
            }
        }
        rendered
    }

    /// Aspect the live camera for `view` currently uses
    pub fn camera_aspect(&self, view: ViewDirection) -> f32 {
        self.rig.aspect(view)
    }

    /// Aspect of the displayed box for `view`
    pub fn surface_aspect(&self, view: ViewDirection) -> f32 {
        self.viewports.descriptor(view).aspect_ratio()
    }
}
