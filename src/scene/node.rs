use std::sync::atomic::{AtomicU64, Ordering};

use cgmath::{Matrix4, Rad, Vector3};

use super::geometry::{Geometry, Material};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Identifies one node instance. Fresh on every construction, including
/// subtree clones, so renderers can key GPU caches by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// An element of the scene graph.
///
/// A node owns an optional geometry, a local transform (translation, XYZ
/// euler rotation in radians, non-uniform scale), an opacity that multiplies
/// down the tree, and its children.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    pub name: String,
    pub geometry: Option<Geometry>,
    pub material: Material,
    pub position: Vector3<f32>,
    pub euler_angles: Vector3<f32>,
    pub scale: Vector3<f32>,
    pub opacity: f32,
    children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::next(),
            name: name.into(),
            geometry: None,
            material: Material::default(),
            position: Vector3::new(0.0, 0.0, 0.0),
            euler_angles: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            opacity: 1.0,
            children: Vec::new(),
        }
    }

    pub fn with_geometry(name: impl Into<String>, geometry: Geometry) -> Self {
        let mut node = Self::new(name);
        node.geometry = Some(geometry);
        node
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vector3::new(x, y, z);
    }

    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.scale = Vector3::new(scale, scale, scale);
    }

    /// The local transform: T * Rz * Ry * Rx * S.
    pub fn to_matrix(&self) -> Matrix4<f32> {
        let t = Matrix4::from_translation(self.position);
        let r = Matrix4::from_angle_z(Rad(self.euler_angles.z))
            * Matrix4::from_angle_y(Rad(self.euler_angles.y))
            * Matrix4::from_angle_x(Rad(self.euler_angles.x));
        let s = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        t * r * s
    }

    /// Deep copy with fresh [`NodeId`]s. Mesh data behind `Arc` is shared,
    /// not duplicated.
    pub fn clone_subtree(&self) -> Node {
        Node {
            id: NodeId::next(),
            name: self.name.clone(),
            geometry: self.geometry.clone(),
            material: self.material,
            position: self.position,
            euler_angles: self.euler_angles,
            scale: self.scale,
            opacity: self.opacity,
            children: self.children.iter().map(Node::clone_subtree).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{vec4, SquareMatrix};
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn new_node_is_identity() {
        let node = Node::new("empty");
        assert!(node.to_matrix().is_identity());
        assert_eq!(node.opacity, 1.0);
        assert!(node.geometry.is_none());
        assert!(node.children().is_empty());
    }

    #[test]
    fn translation_lands_in_the_last_column() {
        let mut node = Node::new("moved");
        node.set_position(1.0, 2.0, 3.0);
        let m = node.to_matrix();
        assert_eq!(m.w.x, 1.0);
        assert_eq!(m.w.y, 2.0);
        assert_eq!(m.w.z, 3.0);
    }

    #[test]
    fn x_rotation_flattens_a_vertical_offset() {
        // Rotating -pi/2 about X maps +Y to -Z: the transform that lays a
        // vertical rectangle flat.
        let mut node = Node::new("flat");
        node.euler_angles.x = -FRAC_PI_2;
        let out = node.to_matrix() * vec4(0.0, 1.0, 0.0, 1.0);
        assert_relative_eq!(out.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(out.y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(out.z, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn scale_applies_before_rotation_and_translation() {
        let mut node = Node::new("scaled");
        node.set_position(10.0, 0.0, 0.0);
        node.set_uniform_scale(0.1);
        let out = node.to_matrix() * vec4(1.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(out.x, 10.1, epsilon = 1e-6);
    }

    #[test]
    fn clone_subtree_gets_fresh_ids() {
        let mut root = Node::new("root");
        root.add_child(Node::new("child"));

        let copy = root.clone_subtree();
        assert_ne!(copy.id(), root.id());
        assert_ne!(copy.children()[0].id(), root.children()[0].id());
        assert_eq!(copy.children()[0].name, "child");
    }
}
