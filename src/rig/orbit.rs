//! Shared orbit state and the six-camera rig
//!
//! Every view looks at the same target from the same distance with the same
//! frustum size. Only the aspect ratio differs per view, and that is pushed in
//! from outside by the reconciliation controller.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::bounds::Aabb;
use super::camera::CameraState;
use super::direction::ViewDirection;

/// Default orbit distance after reset
pub const DEFAULT_DISTANCE: f32 = 5.0;
/// Default frustum height after reset
pub const DEFAULT_FRUSTUM_SIZE: f32 = 4.0;
/// Padding applied to the frustum when framing a bounding box
pub const FRAME_PADDING: f32 = 1.2;
/// Minimum distance when framing, as a multiple of the box's largest dimension
pub const FRAME_DISTANCE_FACTOR: f32 = 2.0;

/// The single logical orbit shared by all six cameras
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    pub target: Vec3,
    pub distance: f32,
    pub frustum_size: f32,
}

impl Default for OrbitState {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: DEFAULT_DISTANCE,
            frustum_size: DEFAULT_FRUSTUM_SIZE,
        }
    }
}

/// Clamp range for distance and zoom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitLimits {
    #[serde(rename = "minDistance")]
    pub min_distance: f32,
    #[serde(rename = "maxDistance")]
    pub max_distance: f32,
    #[serde(rename = "minZoom")]
    pub min_zoom: f32,
    #[serde(rename = "maxZoom")]
    pub max_zoom: f32,
}

impl OrbitLimits {
    /// Repair limits so every clamp range is positive and non-empty
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let mut limits = self;
        if !(limits.min_distance.is_finite() && limits.min_distance > 0.0) {
            limits.min_distance = defaults.min_distance;
        }
        if !(limits.min_zoom.is_finite() && limits.min_zoom > 0.0) {
            limits.min_zoom = defaults.min_zoom;
        }
        if !(limits.max_distance.is_finite() && limits.max_distance >= limits.min_distance) {
            limits.max_distance = limits.min_distance.max(defaults.max_distance);
        }
        if !(limits.max_zoom.is_finite() && limits.max_zoom >= limits.min_zoom) {
            limits.max_zoom = limits.min_zoom.max(defaults.max_zoom);
        }
        limits
    }
}

impl Default for OrbitLimits {
    fn default() -> Self {
        Self {
            min_distance: 0.5,
            max_distance: 100.0,
            min_zoom: 0.1,
            max_zoom: 100.0,
        }
    }
}

/// Serializable camera state for session save/restore
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitSnapshot {
    pub target: [f32; 3],
    pub distance: f32,
    #[serde(rename = "frustumSize")]
    pub frustum_size: f32,
    #[serde(rename = "aspectRatio")]
    pub aspect_ratio: f32,
}

/// Six cameras driven by one orbit
#[derive(Debug, Clone)]
pub struct OrbitRig {
    state: OrbitState,
    limits: OrbitLimits,
    aspects: [f32; 6],
    cameras: [CameraState; 6],
}

impl OrbitRig {
    pub fn new(limits: OrbitLimits) -> Self {
        let sanitized = limits.sanitized();
        if sanitized != limits {
            tracing::warn!(?limits, ?sanitized, "repaired invalid orbit limits");
        }
        let limits = sanitized;
        let state = OrbitState::default();
        let aspects = [1.0; 6];
        let cameras = ViewDirection::ALL.map(|d| CameraState::derive(&state, d, 1.0));
        let mut rig = Self {
            state,
            limits,
            aspects,
            cameras,
        };
        rig.state.distance = rig.clamp_distance(rig.state.distance);
        rig.state.frustum_size = rig.clamp_zoom(rig.state.frustum_size);
        rig.recompute();
        rig
    }

    pub fn state(&self) -> &OrbitState {
        &self.state
    }

    pub fn limits(&self) -> &OrbitLimits {
        &self.limits
    }

    pub fn camera(&self, view: ViewDirection) -> &CameraState {
        &self.cameras[view.index()]
    }

    pub fn cameras(&self) -> &[CameraState; 6] {
        &self.cameras
    }

    pub fn aspect(&self, view: ViewDirection) -> f32 {
        self.aspects[view.index()]
    }

    pub fn set_target(&mut self, target: Vec3) {
        if !target.is_finite() {
            tracing::warn!(?target, "ignoring non-finite orbit target");
            return;
        }
        self.state.target = target;
        self.recompute();
    }

    /// Set the orbit distance, snapping into the configured range
    pub fn set_distance(&mut self, distance: f32) {
        if !distance.is_finite() {
            tracing::warn!(distance, "ignoring non-finite orbit distance");
            return;
        }
        self.state.distance = self.clamp_distance(distance);
        self.recompute();
    }

    /// Set the frustum height, snapping into the configured range
    pub fn set_zoom(&mut self, frustum_size: f32) {
        if !frustum_size.is_finite() {
            tracing::warn!(frustum_size, "ignoring non-finite frustum size");
            return;
        }
        self.state.frustum_size = self.clamp_zoom(frustum_size);
        self.recompute();
    }

    /// Per-view aspect ratio, normally set by the reconciliation controller
    pub fn set_aspect(&mut self, view: ViewDirection, aspect: f32) {
        if !(aspect.is_finite() && aspect > 0.0) {
            tracing::warn!(view = %view, aspect, "ignoring invalid aspect ratio");
            return;
        }
        self.aspects[view.index()] = aspect;
        self.cameras[view.index()] = CameraState::derive(&self.state, view, aspect);
    }

    /// Move the target in the reference view's screen plane.
    ///
    /// `dx` and `dy` are fractions of the reference viewport height, so a drag
    /// across the full viewport height moves the target by one frustum size.
    pub fn pan(&mut self, dx: f32, dy: f32, reference: ViewDirection) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        let cam = self.camera(reference);
        let offset = (cam.right() * dx + cam.screen_up() * dy) * self.state.frustum_size;
        let target = self.state.target + offset;
        self.set_target(target);
    }

    /// Centre the rig on `bounds` so the box is fully visible in every view.
    ///
    /// The frustum covers the box's projected extent in each view, with
    /// narrow views needing a taller frustum to fit the width. The distance
    /// never drops below twice the largest box dimension. Limits are widened
    /// when the box needs more room than they allow.
    pub fn frame_to_bounds(&mut self, bounds: &Aabb) {
        let max_dim = bounds.max_dimension();
        if !(max_dim.is_finite() && max_dim > 0.0) {
            tracing::warn!(?bounds, "cannot frame degenerate bounding box");
            self.set_target(bounds.center());
            return;
        }

        let distance = (max_dim * FRAME_DISTANCE_FACTOR).max(self.limits.min_distance);
        let fitted = self.fitted_frustum(bounds.size()).max(max_dim);
        let frustum_size = (fitted * FRAME_PADDING).max(self.limits.min_zoom);

        if distance > self.limits.max_distance {
            tracing::debug!(distance, "widening max distance to fit bounds");
            self.limits.max_distance = distance;
        }
        if frustum_size > self.limits.max_zoom {
            tracing::debug!(frustum_size, "widening max zoom to fit bounds");
            self.limits.max_zoom = frustum_size;
        }

        self.state = OrbitState {
            target: bounds.center(),
            distance,
            frustum_size,
        };
        self.recompute();
        tracing::debug!(state = ?self.state, "framed bounds");
    }

    /// Restore the default target, distance and zoom
    pub fn reset(&mut self) {
        self.state = OrbitState::default();
        self.state.distance = self.clamp_distance(self.state.distance);
        self.state.frustum_size = self.clamp_zoom(self.state.frustum_size);
        self.recompute();
    }

    pub fn snapshot(&self, view: ViewDirection) -> OrbitSnapshot {
        OrbitSnapshot {
            target: self.state.target.to_array(),
            distance: self.state.distance,
            frustum_size: self.state.frustum_size,
            aspect_ratio: self.aspect(view),
        }
    }

    /// Restore orbit state from a snapshot. The aspect ratio in the snapshot
    /// is informational; live aspects stay owned by the controller.
    /// Non-finite fields are skipped and keep their current value.
    pub fn restore(&mut self, snapshot: &OrbitSnapshot) {
        let target = Vec3::from_array(snapshot.target);
        if target.is_finite() {
            self.state.target = target;
        } else {
            tracing::warn!(?target, "ignoring non-finite snapshot target");
        }
        if snapshot.distance.is_finite() {
            self.state.distance = self.clamp_distance(snapshot.distance);
        } else {
            tracing::warn!(distance = snapshot.distance, "ignoring non-finite snapshot distance");
        }
        if snapshot.frustum_size.is_finite() {
            self.state.frustum_size = self.clamp_zoom(snapshot.frustum_size);
        } else {
            tracing::warn!(frustum_size = snapshot.frustum_size, "ignoring non-finite snapshot frustum size");
        }
        self.recompute();
    }

    /// Smallest frustum height that shows a box of `size` whole in every view
    fn fitted_frustum(&self, size: Vec3) -> f32 {
        self.cameras
            .iter()
            .zip(self.aspects)
            .map(|(cam, aspect)| {
                let width = (size * cam.right()).abs().element_sum();
                let height = (size * cam.screen_up()).abs().element_sum();
                height.max(width / aspect)
            })
            .fold(0.0, f32::max)
    }

    fn clamp_distance(&self, distance: f32) -> f32 {
        distance.clamp(self.limits.min_distance, self.limits.max_distance)
    }

    fn clamp_zoom(&self, frustum_size: f32) -> f32 {
        frustum_size.clamp(self.limits.min_zoom, self.limits.max_zoom)
    }

    fn recompute(&mut self) {
        for view in ViewDirection::ALL {
            self.cameras[view.index()] = CameraState::derive(&self.state, view, self.aspects[view.index()]);
        }
    }
}

impl Default for OrbitRig {
    fn default() -> Self {
        Self::new(OrbitLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_restores_defaults_for_all_cameras() {
        let mut rig = OrbitRig::default();
        rig.set_target(Vec3::new(3.0, -1.0, 2.0));
        rig.set_distance(12.0);
        rig.set_zoom(9.0);
        rig.reset();

        for cam in rig.cameras() {
            assert_eq!(cam.target, Vec3::ZERO);
            assert!((cam.distance() - 5.0).abs() < 1e-6);
            assert_eq!(cam.frustum_size, 4.0);
        }
    }

    #[test]
    fn test_setters_are_idempotent() {
        let mut rig = OrbitRig::default();
        rig.set_aspect(ViewDirection::Left, 1.7);

        rig.set_distance(7.25);
        let once = *rig.cameras();
        rig.set_distance(7.25);
        assert_eq!(once, *rig.cameras());

        rig.set_zoom(2.5);
        let once = *rig.cameras();
        rig.set_zoom(2.5);
        assert_eq!(once, *rig.cameras());
    }

    #[test]
    fn test_distance_and_zoom_clamp() {
        let mut rig = OrbitRig::default();
        rig.set_distance(0.0001);
        assert_eq!(rig.state().distance, rig.limits().min_distance);
        rig.set_distance(1e9);
        assert_eq!(rig.state().distance, rig.limits().max_distance);
        rig.set_zoom(-3.0);
        assert_eq!(rig.state().frustum_size, rig.limits().min_zoom);
        rig.set_zoom(f32::NAN);
        assert_eq!(rig.state().frustum_size, rig.limits().min_zoom);
    }

    #[test]
    fn test_frame_to_bounds_distance_and_clipping() {
        let mut rig = OrbitRig::default();
        let bounds = Aabb::new(Vec3::new(-1.0, 0.0, -0.5), Vec3::new(3.0, 2.0, 0.5));
        rig.frame_to_bounds(&bounds);

        assert!(rig.state().distance >= 2.0 * bounds.max_dimension());
        assert_eq!(rig.state().target, bounds.center());
        assert!((rig.state().frustum_size - 4.0 * FRAME_PADDING).abs() < 1e-5);

        assert_box_in_frame(&rig, &bounds);
    }

    fn assert_box_in_frame(rig: &OrbitRig, bounds: &Aabb) {
        for cam in rig.cameras() {
            let view_proj = cam.view_projection_matrix();
            for corner in bounds.corners() {
                let depth = cam.view_depth(corner);
                assert!(depth > cam.bounds.near, "{} clips near", cam.direction);
                assert!(depth < cam.bounds.far, "{} clips far", cam.direction);
                let ndc = view_proj.project_point3(corner);
                assert!(ndc.x.abs() <= 1.0 + 1e-5, "{} overflows horizontally", cam.direction);
                assert!(ndc.y.abs() <= 1.0 + 1e-5, "{} overflows vertically", cam.direction);
            }
        }
    }

    #[test]
    fn test_frame_to_bounds_fits_wide_box_in_portrait_views() {
        let mut rig = OrbitRig::default();
        for view in ViewDirection::ALL {
            rig.set_aspect(view, 0.8);
        }
        let bounds = Aabb::new(Vec3::new(-2.0, -0.5, -0.5), Vec3::new(2.0, 0.5, 0.5));
        rig.frame_to_bounds(&bounds);

        assert!((rig.state().frustum_size - 4.0 / 0.8 * FRAME_PADDING).abs() < 1e-4);
        assert_box_in_frame(&rig, &bounds);
    }

    #[test]
    fn test_restore_skips_non_finite_fields() {
        let mut rig = OrbitRig::default();
        rig.set_target(Vec3::new(1.0, 1.0, 1.0));
        rig.restore(&OrbitSnapshot {
            target: [f32::NAN, 0.0, 0.0],
            distance: f32::NAN,
            frustum_size: 3.0,
            aspect_ratio: 1.0,
        });

        assert_eq!(rig.state().target, Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(rig.state().distance, DEFAULT_DISTANCE);
        assert_eq!(rig.state().frustum_size, 3.0);
        assert!(rig.cameras().iter().all(|cam| cam.position.is_finite()));
    }

    #[test]
    fn test_inverted_limits_are_repaired() {
        let limits = OrbitLimits {
            min_distance: 10.0,
            max_distance: 1.0,
            min_zoom: f32::NAN,
            max_zoom: 100.0,
        };
        let mut rig = OrbitRig::new(limits);
        assert!(rig.limits().max_distance >= rig.limits().min_distance);
        assert_eq!(rig.limits().min_zoom, OrbitLimits::default().min_zoom);

        rig.set_distance(3.0);
        assert_eq!(rig.state().distance, 10.0);
        rig.set_zoom(0.0);
        assert_eq!(rig.state().frustum_size, rig.limits().min_zoom);
    }

    #[test]
    fn test_frame_to_bounds_widens_limits_for_huge_assets() {
        let mut rig = OrbitRig::default();
        let bounds = Aabb::new(Vec3::splat(-200.0), Vec3::splat(200.0));
        rig.frame_to_bounds(&bounds);
        assert_eq!(rig.state().distance, 800.0);
        assert!(rig.limits().max_distance >= 800.0);
    }

    #[test]
    fn test_pan_moves_along_reference_screen_axes() {
        let mut rig = OrbitRig::default();
        rig.pan(0.5, 0.0, ViewDirection::Front);
        assert!((rig.state().target - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);

        rig.reset();
        rig.pan(0.0, 0.25, ViewDirection::Top);
        // Top view's screen up is -Z
        assert!((rig.state().target - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_snapshot_roundtrip_through_json() {
        let mut rig = OrbitRig::default();
        rig.set_target(Vec3::new(1.0, 2.0, 3.0));
        rig.set_aspect(ViewDirection::Front, 1.5);
        let snapshot = rig.snapshot(ViewDirection::Front);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("frustumSize"));

        let mut other = OrbitRig::default();
        other.restore(&serde_json::from_str(&json).unwrap());
        assert_eq!(other.state(), rig.state());
    }
}
