//! Geometry attached to scene nodes: raw triangle meshes and the resizable
//! flat rectangle used to visualize detected surfaces.

use std::sync::Arc;

/// Triangle mesh data in the layout the renderer uploads directly.
///
/// `positions` and `normals` are flat xyz triples, indices are CCW triangles.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(positions: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals,
            indices,
        }
    }

    pub fn vertex_count(&self) -> u32 {
        (self.positions.len() / 3) as u32
    }

    pub fn triangle_count(&self) -> u32 {
        (self.indices.len() / 3) as u32
    }

    /// Computes smooth per-vertex normals from face geometry, for meshes
    /// that come without them.
    pub fn face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0f32; positions.len()];

        for triangle in indices.chunks(3) {
            let i0 = triangle[0] as usize;
            let i1 = triangle[1] as usize;
            let i2 = triangle[2] as usize;

            let v0 = [
                positions[i0 * 3],
                positions[i0 * 3 + 1],
                positions[i0 * 3 + 2],
            ];
            let v1 = [
                positions[i1 * 3],
                positions[i1 * 3 + 1],
                positions[i1 * 3 + 2],
            ];
            let v2 = [
                positions[i2 * 3],
                positions[i2 * 3 + 1],
                positions[i2 * 3 + 2],
            ];

            let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];

            let face_normal = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];

            for &vertex_idx in &[i0, i1, i2] {
                normals[vertex_idx * 3] += face_normal[0];
                normals[vertex_idx * 3 + 1] += face_normal[1];
                normals[vertex_idx * 3 + 2] += face_normal[2];
            }
        }

        for i in 0..vertex_count {
            let length = (normals[i * 3].powi(2)
                + normals[i * 3 + 1].powi(2)
                + normals[i * 3 + 2].powi(2))
            .sqrt();
            if length > 0.0 {
                normals[i * 3] /= length;
                normals[i * 3 + 1] /= length;
                normals[i * 3 + 2] /= length;
            }
        }

        normals
    }
}

/// A flat rectangle in the XY plane facing +Z, resizable in place.
///
/// Width runs along X and height along Y, centered on the node origin. Nodes
/// that should lie flat rotate themselves (the detected-surface overlay uses
/// a -pi/2 rotation about X).
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneShape {
    width: f32,
    height: f32,
    revision: u64,
}

impl PlaneShape {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            revision: 0,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Resizes the rectangle without recreating the node that owns it.
    pub fn set_size(&mut self, width: f32, height: f32) {
        if self.width != width || self.height != height {
            self.width = width;
            self.height = height;
            self.revision += 1;
        }
    }

    pub fn mesh_data(&self) -> MeshData {
        let hw = self.width * 0.5;
        let hh = self.height * 0.5;
        MeshData::new(
            vec![
                -hw, -hh, 0.0, //
                hw, -hh, 0.0, //
                hw, hh, 0.0, //
                -hw, hh, 0.0,
            ],
            vec![
                0.0, 0.0, 1.0, //
                0.0, 0.0, 1.0, //
                0.0, 0.0, 1.0, //
                0.0, 0.0, 1.0,
            ],
            vec![0, 1, 2, 2, 3, 0],
        )
    }
}

/// Surface appearance of a node's geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// RGBA base color; alpha multiplies with node opacity at draw time.
    pub base_color: [f32; 4],
}

impl Material {
    pub fn new(base_color: [f32; 4]) -> Self {
        Self { base_color }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: [0.8, 0.8, 0.8, 1.0],
        }
    }
}

/// Geometry a node can carry.
#[derive(Debug, Clone)]
pub enum Geometry {
    /// A resizable flat rectangle.
    Plane(PlaneShape),
    /// A fixed triangle mesh, shared between clones of a model.
    Mesh(Arc<MeshData>),
}

impl Geometry {
    /// Changes whenever the geometry's mesh data changes, so renderers know
    /// when to re-upload.
    pub fn revision(&self) -> u64 {
        match self {
            Geometry::Plane(plane) => plane.revision,
            Geometry::Mesh(_) => 0,
        }
    }

    pub fn mesh_data(&self) -> std::borrow::Cow<'_, MeshData> {
        match self {
            Geometry::Plane(plane) => std::borrow::Cow::Owned(plane.mesh_data()),
            Geometry::Mesh(mesh) => std::borrow::Cow::Borrowed(mesh.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_mesh_matches_requested_size() {
        let plane = PlaneShape::new(2.0, 3.0);
        let mesh = plane.mesh_data();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);

        let xs: Vec<f32> = mesh.positions.chunks(3).map(|v| v[0]).collect();
        let ys: Vec<f32> = mesh.positions.chunks(3).map(|v| v[1]).collect();
        let zs: Vec<f32> = mesh.positions.chunks(3).map(|v| v[2]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 1.0);
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), -1.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 1.5);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), -1.5);
        assert!(zs.iter().all(|&z| z == 0.0));
    }

    #[test]
    fn plane_normals_face_positive_z() {
        let mesh = PlaneShape::new(1.0, 1.0).mesh_data();
        for normal in mesh.normals.chunks(3) {
            assert_eq!(normal, &[0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn resize_bumps_revision_in_place() {
        let mut plane = PlaneShape::new(1.0, 1.0);
        let before = plane.revision;
        plane.set_size(2.0, 2.5);
        assert_eq!(plane.width(), 2.0);
        assert_eq!(plane.height(), 2.5);
        assert!(plane.revision > before);

        // A no-op resize does not invalidate uploaded geometry.
        let unchanged = plane.revision;
        plane.set_size(2.0, 2.5);
        assert_eq!(plane.revision, unchanged);
    }

    #[test]
    fn face_normals_for_a_flat_triangle_point_up() {
        let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, -1.0];
        let normals = MeshData::face_normals(&positions, &[0, 1, 2]);
        for normal in normals.chunks(3) {
            assert!((normal[0]).abs() < 1e-6);
            assert!((normal[1] - 1.0).abs() < 1e-6);
            assert!((normal[2]).abs() < 1e-6);
        }
    }
}
