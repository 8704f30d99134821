//! Derived per-view camera state
//!
//! Cameras are never edited by hand: [`CameraState::derive`] is the only
//! constructor used by the rig. Export clones go through [`CameraState::with_aspect`]
//! and [`CameraState::orbited`], which return new values and leave the live
//! camera untouched.

use glam::{Mat4, Quat, Vec3};

use super::direction::ViewDirection;
use super::orbit::OrbitState;

/// Near clipping plane for every orthographic camera
pub const NEAR_PLANE: f32 = 0.1;
/// Far plane as a multiple of the orbit distance
pub const FAR_DISTANCE_FACTOR: f32 = 4.0;

/// Orthographic projection bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionBounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
}

impl ProjectionBounds {
    /// Bounds for a frustum of `frustum_size` world units tall at `aspect` (width/height)
    pub fn from_frustum(frustum_size: f32, aspect: f32, distance: f32) -> Self {
        let half_h = frustum_size * 0.5;
        let half_w = half_h * aspect;
        Self {
            left: -half_w,
            right: half_w,
            top: half_h,
            bottom: -half_h,
            near: NEAR_PLANE,
            far: distance * FAR_DISTANCE_FACTOR,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    pub fn aspect(&self) -> f32 {
        self.width() / self.height()
    }
}

/// Pose and projection for one view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub direction: ViewDirection,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub frustum_size: f32,
    pub aspect: f32,
    pub bounds: ProjectionBounds,
}

impl CameraState {
    /// Derive the camera for `direction` from the shared orbit state
    pub fn derive(orbit: &OrbitState, direction: ViewDirection, aspect: f32) -> Self {
        Self {
            direction,
            position: orbit.target + direction.unit_vector() * orbit.distance,
            target: orbit.target,
            up: direction.up_vector(),
            frustum_size: orbit.frustum_size,
            aspect,
            bounds: ProjectionBounds::from_frustum(orbit.frustum_size, aspect, orbit.distance),
        }
    }

    /// Copy with projection bounds rebuilt for `aspect`; pose and frustum are preserved
    pub fn with_aspect(&self, aspect: f32) -> Self {
        Self {
            aspect,
            bounds: ProjectionBounds::from_frustum(self.frustum_size, aspect, self.distance()),
            ..*self
        }
    }

    /// Copy rotated about the target's vertical axis, used for turntable frames
    pub fn orbited(&self, angle: f32) -> Self {
        let rotation = Quat::from_axis_angle(Vec3::Y, angle);
        Self {
            position: self.target + rotation * (self.position - self.target),
            up: rotation * self.up,
            ..*self
        }
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    /// Unit vector the camera looks along
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    /// Screen-space right axis in world coordinates
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    /// Screen-space up axis in world coordinates
    pub fn screen_up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let b = &self.bounds;
        Mat4::orthographic_rh(b.left, b.right, b.bottom, b.top, b.near, b.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Depth of `point` along the view axis, measured from the camera
    pub fn view_depth(&self, point: Vec3) -> f32 {
        (point - self.position).dot(self.forward())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_positions_camera_along_direction() {
        let orbit = OrbitState::default();
        let cam = CameraState::derive(&orbit, ViewDirection::Right, 2.0);
        assert_eq!(cam.position, Vec3::new(5.0, 0.0, 0.0));
        assert!((cam.bounds.aspect() - 2.0).abs() < 1e-6);
        assert_eq!(cam.bounds.height(), 4.0);
    }

    #[test]
    fn test_with_aspect_preserves_pose() {
        let orbit = OrbitState::default();
        let live = CameraState::derive(&orbit, ViewDirection::Top, 1.0);
        let clone = live.with_aspect(16.0 / 9.0);
        assert_eq!(clone.position, live.position);
        assert_eq!(clone.up, live.up);
        assert_eq!(clone.bounds.height(), live.bounds.height());
        assert!((clone.bounds.aspect() - 16.0 / 9.0).abs() < 1e-5);
        assert_eq!(live.aspect, 1.0);
    }

    #[test]
    fn test_target_projects_to_center() {
        let orbit = OrbitState::default();
        for dir in ViewDirection::ALL {
            let cam = CameraState::derive(&orbit, dir, 1.5);
            let ndc = cam.view_projection_matrix().project_point3(orbit.target);
            assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5, "{}: {:?}", dir, ndc);
            assert!(ndc.z > 0.0 && ndc.z < 1.0);
        }
    }

    #[test]
    fn test_orbited_quarter_turn() {
        let orbit = OrbitState::default();
        let front = CameraState::derive(&orbit, ViewDirection::Front, 1.0);
        let turned = front.orbited(std::f32::consts::FRAC_PI_2);
        assert!((turned.position - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-4);
        assert!((turned.distance() - 5.0).abs() < 1e-4);
    }
}
