//! Aspect-ratio reconciliation between viewports, cameras and export
//!
//! The controller is a two-state machine. Transitions return the
//! [`ResizeDirective`] the surface layer must apply; pushing aspects into the
//! rig happens in [`ReconciliationController::reconcile`].

use super::mode::{ReconciliationMode, ResizeDirective};
use crate::rig::{OrbitRig, ViewDirection};
use crate::template::ExportPreset;
use crate::viewport::ViewportRegistry;

/// Tolerance used when comparing a resolution's aspect to the preview target
pub const DEFAULT_ASPECT_EPSILON: f32 = 1e-3;

/// Rejected mode transitions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReconcileError {
    #[error("export preview already active with preset '{preset_id}'; change the preset instead")]
    AlreadyInPreview { preset_id: String },
    #[error("export preview is not active")]
    NotInPreview,
    #[error("invalid target aspect ratio {0}")]
    InvalidAspect(f32),
    #[error("unknown export preset '{0}'")]
    UnknownPreset(String),
}

/// Owns the active [`ReconciliationMode`]
#[derive(Debug, Clone, Default)]
pub struct ReconciliationController {
    mode: ReconciliationMode,
}

impl ReconciliationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &ReconciliationMode {
        &self.mode
    }

    pub fn is_preview(&self) -> bool {
        self.mode.is_preview()
    }

    pub fn target_aspect(&self) -> Option<f32> {
        self.mode.target_aspect()
    }

    /// Adaptive → ExportPreview
    pub fn enable(&mut self, preset: &ExportPreset) -> Result<ResizeDirective, ReconcileError> {
        if let ReconciliationMode::ExportPreview { preset_id, .. } = &self.mode {
            return Err(ReconcileError::AlreadyInPreview {
                preset_id: preset_id.clone(),
            });
        }
        self.enter(preset)
    }

    /// ExportPreview → ExportPreview with a new target, no disable/enable cycle
    pub fn change_preset(&mut self, preset: &ExportPreset) -> Result<ResizeDirective, ReconcileError> {
        if !self.mode.is_preview() {
            return Err(ReconcileError::NotInPreview);
        }
        self.enter(preset)
    }

    /// ExportPreview → Adaptive
    pub fn disable(&mut self) -> Result<ResizeDirective, ReconcileError> {
        if !self.mode.is_preview() {
            return Err(ReconcileError::NotInPreview);
        }
        self.mode = ReconciliationMode::Adaptive;
        tracing::info!("export preview disabled");
        Ok(ResizeDirective::RestoreNatural)
    }

    fn enter(&mut self, preset: &ExportPreset) -> Result<ResizeDirective, ReconcileError> {
        let aspect = preset.aspect();
        if !(aspect.is_finite() && aspect > 0.0) {
            return Err(ReconcileError::InvalidAspect(aspect));
        }
        self.mode = ReconciliationMode::ExportPreview {
            target_aspect: aspect,
            preset_id: preset.id.clone(),
        };
        tracing::info!(preset = %preset.id, aspect, "export preview enabled");
        Ok(ResizeDirective::Crop { aspect })
    }

    /// Directive matching the current mode, used after layout changes
    pub fn current_directive(&self) -> ResizeDirective {
        match self.mode.target_aspect() {
            Some(aspect) => ResizeDirective::Crop { aspect },
            None => ResizeDirective::RestoreNatural,
        }
    }

    /// Aspect the camera for `view` must use right now
    pub fn aspect_for(&self, registry: &ViewportRegistry, view: ViewDirection) -> f32 {
        match self.mode.target_aspect() {
            Some(aspect) => aspect,
            None => registry.descriptor(view).aspect_ratio(),
        }
    }

    /// Push the reconciled aspect of every view into the rig
    pub fn reconcile(&self, registry: &ViewportRegistry, rig: &mut OrbitRig) {
        for view in ViewDirection::ALL {
            rig.set_aspect(view, self.aspect_for(registry, view));
        }
        tracing::debug!(mode = %self.mode, "reconciled camera aspects");
    }

    /// Whether a capture at `aspect` can reuse the live surface
    pub fn matches_target(&self, aspect: f32, epsilon: f32) -> bool {
        self.mode
            .target_aspect()
            .is_some_and(|target| (target - aspect).abs() < epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::{DisplaySize, RasterSurface};

    fn hd() -> ExportPreset {
        ExportPreset::new("hd-1080p", "HD 1080p", 1920, 1080)
    }

    fn registry_with_sizes() -> ViewportRegistry {
        let mut reg = ViewportRegistry::new(DisplaySize::new(1, 1));
        let sizes = [(400, 300), (300, 400), (500, 500), (640, 360), (320, 240), (123, 457)];
        for (view, (w, h)) in ViewDirection::ALL.into_iter().zip(sizes) {
            let size = DisplaySize::new(w, h);
            reg.attach(view, Box::new(RasterSurface::new(size)), size);
        }
        reg
    }

    #[test]
    fn test_transition_table() {
        let mut ctl = ReconciliationController::new();
        assert_eq!(ctl.disable(), Err(ReconcileError::NotInPreview));
        assert_eq!(ctl.change_preset(&hd()), Err(ReconcileError::NotInPreview));

        let directive = ctl.enable(&hd()).unwrap();
        assert!(matches!(directive, ResizeDirective::Crop { .. }));
        assert!(matches!(ctl.enable(&hd()), Err(ReconcileError::AlreadyInPreview { .. })));

        let square = ExportPreset::new("square-2k", "Square", 2048, 2048);
        assert_eq!(ctl.change_preset(&square).unwrap(), ResizeDirective::Crop { aspect: 1.0 });
        assert_eq!(ctl.mode().preset_id(), Some("square-2k"));

        assert_eq!(ctl.disable().unwrap(), ResizeDirective::RestoreNatural);
        assert_eq!(*ctl.mode(), ReconciliationMode::Adaptive);
    }

    #[test]
    fn test_zero_height_preset_rejected_without_state_change() {
        let mut ctl = ReconciliationController::new();
        let broken = ExportPreset::new("broken", "Broken", 1920, 0);
        assert!(matches!(ctl.enable(&broken), Err(ReconcileError::InvalidAspect(_))));
        assert!(!ctl.is_preview());
    }

    #[test]
    fn test_adaptive_follows_each_surface() {
        let reg = registry_with_sizes();
        let mut rig = OrbitRig::default();
        let ctl = ReconciliationController::new();
        ctl.reconcile(&reg, &mut rig);
        for view in ViewDirection::ALL {
            assert_eq!(rig.aspect(view), reg.descriptor(view).aspect_ratio());
            assert_eq!(rig.camera(view).aspect, rig.aspect(view));
        }
    }

    #[test]
    fn test_preview_pins_every_camera() {
        let reg = registry_with_sizes();
        let mut rig = OrbitRig::default();
        let mut ctl = ReconciliationController::new();
        ctl.enable(&hd()).unwrap();
        ctl.reconcile(&reg, &mut rig);
        for view in ViewDirection::ALL {
            assert!((rig.aspect(view) - 16.0 / 9.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_matches_target_epsilon() {
        let mut ctl = ReconciliationController::new();
        assert!(!ctl.matches_target(16.0 / 9.0, DEFAULT_ASPECT_EPSILON));
        ctl.enable(&hd()).unwrap();
        assert!(ctl.matches_target(3840.0 / 2160.0, DEFAULT_ASPECT_EPSILON));
        assert!(ctl.matches_target(1921.0 / 1080.0, DEFAULT_ASPECT_EPSILON));
        assert!(!ctl.matches_target(4.0 / 3.0, DEFAULT_ASPECT_EPSILON));
    }
}
