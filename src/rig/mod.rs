//! Synchronized six-view orbit rig
//!
//! One orbit (target, distance, frustum size) drives six orthographic cameras.
//! Each camera keeps its own aspect ratio.

pub mod bounds;
pub mod camera;
pub mod direction;
pub mod orbit;

pub use bounds::Aabb;
pub use camera::{CameraState, ProjectionBounds};
pub use direction::{UnknownView, ViewDirection};
pub use orbit::{OrbitLimits, OrbitRig, OrbitSnapshot, OrbitState};
