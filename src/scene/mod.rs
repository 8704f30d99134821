//! Scene provider boundary
//!
//! The engine never owns geometry beyond what it needs to render. Surfaces
//! draw whatever a [`SceneProvider`] hands them.

pub mod flags;
pub mod mesh;

pub use flags::{BackgroundSpec, FlagOverrides, RenderFlags, ScopedFlags};
pub use mesh::Mesh;

use glam::Vec3;

use crate::rig::Aabb;

/// Renderable scene plus its transient render flags
pub trait SceneProvider: Send {
    fn meshes(&self) -> &[Mesh];

    /// Bounding box of all geometry, `None` when the scene is empty
    fn bounding_box(&self) -> Option<Aabb> {
        self.meshes()
            .iter()
            .filter_map(Mesh::bounds)
            .reduce(|a, b| a.union(&b))
    }

    fn flags(&self) -> RenderFlags;

    fn set_flags(&mut self, flags: RenderFlags);
}

/// In-memory scene of flat-coloured meshes
#[derive(Debug, Clone, Default)]
pub struct Scene {
    meshes: Vec<Mesh>,
    flags: RenderFlags,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.meshes.push(mesh);
        self
    }

    /// Small stand-in asset: a plinth with a column and a cap
    pub fn demo() -> Self {
        Scene::new()
            .with_mesh(
                Mesh::cuboid("plinth", Vec3::new(0.0, -0.8, 0.0), Vec3::new(2.0, 0.4, 1.4))
                    .with_color([120, 110, 100, 255]),
            )
            .with_mesh(
                Mesh::cuboid("column", Vec3::new(0.0, 0.2, 0.0), Vec3::new(0.6, 1.6, 0.6))
                    .with_color([190, 180, 160, 255]),
            )
            .with_mesh(
                Mesh::cuboid("cap", Vec3::new(0.3, 1.15, 0.0), Vec3::new(1.2, 0.3, 0.9))
                    .with_color([160, 70, 60, 255]),
            )
    }
}

impl SceneProvider for Scene {
    fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    fn flags(&self) -> RenderFlags {
        self.flags
    }

    fn set_flags(&mut self, flags: RenderFlags) {
        self.flags = flags;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scene_has_no_bounds() {
        assert!(Scene::new().bounding_box().is_none());
    }

    #[test]
    fn test_demo_bounds_cover_all_meshes() {
        let scene = Scene::demo();
        let bounds = scene.bounding_box().unwrap();
        assert!((bounds.min.y + 1.0).abs() < 1e-5);
        assert!((bounds.max.y - 1.3).abs() < 1e-5);
        assert!((bounds.max.x - 1.0).abs() < 1e-5);
    }
}
