//! The demo's scene delegate: overlays every detected surface with a
//! translucent blue rectangle sized to the surface extent, plus a small copy
//! of the ship model placed at the surface center.

use std::f32::consts::FRAC_PI_2;

use crate::ar::PlaneAnchor;
use crate::scene::{Geometry, Material, ModelAsset, Node, PlaneShape, SceneDelegate};

const FLOOR_COLOR: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
const FLOOR_OPACITY: f32 = 0.125;
const SHIP_SCALE: f32 = 0.1;

/// Overlays detected surfaces with a floor rectangle and a ship instance.
pub struct PlaneOverlay {
    ship: ModelAsset,
}

impl PlaneOverlay {
    pub fn new(ship: ModelAsset) -> Self {
        Self { ship }
    }

    /// A flat rectangle sized to the anchor's extent, tinted blue, rotated
    /// to lie flat, left at the anchor-node origin.
    pub fn create_floor(anchor: &PlaneAnchor) -> Node {
        let plane = PlaneShape::new(anchor.extent.width, anchor.extent.depth);
        let mut node = Node::with_geometry("floor", Geometry::Plane(plane));
        node.material = Material::new(FLOOR_COLOR);
        node.euler_angles.x = -FRAC_PI_2;
        node.opacity = FLOOR_OPACITY;
        node
    }

    /// A copy of the ship model, scaled down and positioned at the anchor's
    /// center.
    pub fn create_ship(&self, anchor: &PlaneAnchor) -> Node {
        let mut node = self.ship.instantiate();
        node.set_position(anchor.center.x, 0.0, anchor.center.z);
        node.set_uniform_scale(SHIP_SCALE);
        node
    }
}

impl SceneDelegate for PlaneOverlay {
    fn node_added(&mut self, node: &mut Node, anchor: &PlaneAnchor) {
        node.add_child(Self::create_floor(anchor));
        node.add_child(self.create_ship(anchor));
    }

    fn node_updated(&mut self, node: &mut Node, anchor: &PlaneAnchor) {
        // The floor is the first child by construction; anything else means
        // someone rearranged the subtree and the update is skipped.
        let Some(floor) = node.children_mut().first_mut() else {
            return;
        };
        let Some(Geometry::Plane(plane)) = floor.geometry.as_mut() else {
            return;
        };

        plane.set_size(anchor.extent.width, anchor.extent.depth);
        floor.set_position(anchor.center.x, 0.0, anchor.center.z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::{AnchorId, Extent};
    use cgmath::Vector3;

    const TRIANGLE_OBJ: &str = "\
o hull
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 0.0 -1.0
vn 0.0 1.0 0.0
f 1//1 2//1 3//1
";

    fn ship() -> ModelAsset {
        ModelAsset::from_obj_text("ship", TRIANGLE_OBJ).unwrap()
    }

    fn anchor() -> PlaneAnchor {
        PlaneAnchor {
            id: AnchorId(0),
            position: Vector3::new(0.0, -1.0, 0.0),
            center: Vector3::new(1.0, 0.0, 5.0),
            extent: Extent::new(2.0, 3.0),
        }
    }

    #[test]
    fn floor_matches_the_anchor_extent() {
        let floor = PlaneOverlay::create_floor(&anchor());

        let Some(Geometry::Plane(plane)) = &floor.geometry else {
            panic!("expected plane geometry");
        };
        assert_eq!(plane.width(), 2.0);
        assert_eq!(plane.height(), 3.0);

        // Lies flat, tinted, translucent, no offset of its own.
        assert_eq!(floor.euler_angles.x, -FRAC_PI_2);
        assert_eq!(floor.euler_angles.y, 0.0);
        assert_eq!(floor.euler_angles.z, 0.0);
        assert_eq!(floor.opacity, 0.125);
        assert_eq!(floor.material.base_color, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(floor.position, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn ship_sits_scaled_at_the_anchor_center() {
        let overlay = PlaneOverlay::new(ship());
        let node = overlay.create_ship(&anchor());

        assert_eq!(node.position, Vector3::new(1.0, 0.0, 5.0));
        assert_eq!(node.scale, Vector3::new(0.1, 0.1, 0.1));
        assert!(!node.children().is_empty());
    }

    #[test]
    fn added_anchor_gets_floor_then_ship() {
        let mut overlay = PlaneOverlay::new(ship());
        let mut node = Node::new("anchor-0");
        overlay.node_added(&mut node, &anchor());

        assert_eq!(node.children().len(), 2);
        assert_eq!(node.children()[0].name, "floor");
        assert_eq!(node.children()[1].name, "ship");
    }

    #[test]
    fn update_resizes_the_floor_in_place() {
        let mut overlay = PlaneOverlay::new(ship());
        let mut node = Node::new("anchor-0");
        overlay.node_added(&mut node, &anchor());
        let floor_id = node.children()[0].id();

        let mut revised = anchor();
        revised.extent = Extent::new(4.0, 6.0);
        revised.center = Vector3::new(-0.5, 0.0, 2.0);
        overlay.node_updated(&mut node, &revised);

        // Same node pair, mutated in place.
        assert_eq!(node.children().len(), 2);
        let floor = &node.children()[0];
        assert_eq!(floor.id(), floor_id);
        let Some(Geometry::Plane(plane)) = &floor.geometry else {
            panic!("expected plane geometry");
        };
        assert_eq!(plane.width(), 4.0);
        assert_eq!(plane.height(), 6.0);
        assert_eq!(floor.position, Vector3::new(-0.5, 0.0, 2.0));
    }

    #[test]
    fn update_without_a_plane_first_child_is_a_no_op() {
        let mut overlay = PlaneOverlay::new(ship());

        let mut empty = Node::new("anchor-0");
        overlay.node_updated(&mut empty, &anchor());
        assert!(empty.children().is_empty());

        let mut odd = Node::new("anchor-1");
        odd.add_child(Node::new("not-a-floor"));
        overlay.node_updated(&mut odd, &anchor());
        assert_eq!(odd.children()[0].position, Vector3::new(0.0, 0.0, 0.0));
    }
}
