//! Triangle meshes handed to surfaces for rendering

use glam::Vec3;

use crate::rig::Aabb;

/// Indexed triangle mesh with a single flat colour
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub color: [u8; 4],
}

impl Mesh {
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            name: name.into(),
            positions,
            triangles,
            color: [200, 200, 205, 255],
        }
    }

    pub fn with_color(mut self, color: [u8; 4]) -> Self {
        self.color = color;
        self
    }

    /// Axis-aligned box centred on `center`
    pub fn cuboid(name: impl Into<String>, center: Vec3, size: Vec3) -> Self {
        let h = size * 0.5;
        let positions = vec![
            center + Vec3::new(-h.x, -h.y, -h.z),
            center + Vec3::new(h.x, -h.y, -h.z),
            center + Vec3::new(h.x, h.y, -h.z),
            center + Vec3::new(-h.x, h.y, -h.z),
            center + Vec3::new(-h.x, -h.y, h.z),
            center + Vec3::new(h.x, -h.y, h.z),
            center + Vec3::new(h.x, h.y, h.z),
            center + Vec3::new(-h.x, h.y, h.z),
        ];
        // Counter-clockwise when seen from outside
        let triangles = vec![
            // +Z
            [4, 5, 6],
            [4, 6, 7],
            // -Z
            [1, 0, 3],
            [1, 3, 2],
            // +X
            [5, 1, 2],
            [5, 2, 6],
            // -X
            [0, 4, 7],
            [0, 7, 3],
            // +Y
            [7, 6, 2],
            [7, 2, 3],
            // -Y
            [0, 1, 5],
            [0, 5, 4],
        ];
        Self::new(name, positions, triangles)
    }

    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }

    /// Iterate triangles as vertex triples, skipping out-of-range indices
    pub fn triangle_vertices(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.triangles.iter().filter_map(|t| {
            let a = *self.positions.get(t[0] as usize)?;
            let b = *self.positions.get(t[1] as usize)?;
            let c = *self.positions.get(t[2] as usize)?;
            Some([a, b, c])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_bounds() {
        let mesh = Mesh::cuboid("box", Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 4.0, 6.0));
        let bounds = mesh.bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(0.0, -2.0, -3.0));
        assert_eq!(bounds.max, Vec3::new(2.0, 2.0, 3.0));
        assert_eq!(mesh.triangle_vertices().count(), 12);
    }

    #[test]
    fn test_cuboid_normals_point_outwards() {
        let mesh = Mesh::cuboid("box", Vec3::ZERO, Vec3::ONE);
        for [a, b, c] in mesh.triangle_vertices() {
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_bad_indices_are_skipped() {
        let mesh = Mesh::new("broken", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2], [0, 1, 9]]);
        assert_eq!(mesh.triangle_vertices().count(), 1);
    }
}
