//! # Scene Module
//!
//! Node tree, anchor-to-node registry, the delegate contract invoked as
//! surfaces come and go, and model asset loading.

pub mod asset;
pub mod geometry;
pub mod node;

// Re-export main types
pub use asset::{AssetError, ModelAsset};
pub use geometry::{Geometry, Material, MeshData, PlaneShape};
pub use node::{Node, NodeId};

use std::collections::HashMap;

use cgmath::Matrix4;
use cgmath::SquareMatrix;

use crate::ar::{AnchorEvent, AnchorId, PlaneAnchor};

/// Callback contract invoked by the scene as anchors are reported.
///
/// `node_added` receives a freshly created, empty node already positioned at
/// the anchor origin and is expected to attach content to it. `node_updated`
/// receives the same node again whenever the anchor's geometry estimate is
/// revised and is expected to mutate the content in place.
pub trait SceneDelegate {
    fn node_added(&mut self, node: &mut Node, anchor: &PlaneAnchor);
    fn node_updated(&mut self, node: &mut Node, anchor: &PlaneAnchor);
}

/// The rendered node tree, with one subtree per reported anchor.
#[derive(Default)]
pub struct Scene {
    anchor_nodes: HashMap<AnchorId, Node>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one anchor notification, routing it through the delegate.
    ///
    /// An `Added` for an id that already has a node is ignored, as is an
    /// `Updated` for an unknown id; each anchor has at most one subtree and
    /// updates never create or destroy nodes.
    pub fn apply(&mut self, event: &AnchorEvent, delegate: &mut dyn SceneDelegate) {
        match event {
            AnchorEvent::Added(anchor) => {
                if self.anchor_nodes.contains_key(&anchor.id) {
                    return;
                }
                let mut node = Node::new(format!("anchor-{}", anchor.id.0));
                node.position = anchor.position;
                delegate.node_added(&mut node, anchor);
                self.anchor_nodes.insert(anchor.id, node);
            }
            AnchorEvent::Updated(anchor) => {
                let Some(node) = self.anchor_nodes.get_mut(&anchor.id) else {
                    return;
                };
                node.position = anchor.position;
                delegate.node_updated(node, anchor);
            }
        }
    }

    pub fn node_for(&self, id: AnchorId) -> Option<&Node> {
        self.anchor_nodes.get(&id)
    }

    pub fn anchor_count(&self) -> usize {
        self.anchor_nodes.len()
    }

    /// Drops every anchor subtree. Session teardown only; nothing in the
    /// live loop removes nodes.
    pub fn clear(&mut self) {
        self.anchor_nodes.clear();
    }

    /// Depth-first traversal yielding each node with its composed world
    /// transform and inherited opacity.
    pub fn visit(&self, f: &mut impl FnMut(&Node, Matrix4<f32>, f32)) {
        for node in self.anchor_nodes.values() {
            visit_node(node, Matrix4::identity(), 1.0, f);
        }
    }
}

fn visit_node(
    node: &Node,
    parent: Matrix4<f32>,
    parent_opacity: f32,
    f: &mut impl FnMut(&Node, Matrix4<f32>, f32),
) {
    let world = parent * node.to_matrix();
    let opacity = parent_opacity * node.opacity;
    f(node, world, opacity);
    for child in node.children() {
        visit_node(child, world, opacity, f);
    }
}
