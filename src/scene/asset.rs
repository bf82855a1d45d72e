//! Loading of pre-made 3D models (OBJ + MTL) into node subtrees.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use super::geometry::{Geometry, Material, MeshData};
use super::node::Node;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to load OBJ model: {0}")]
    Load(#[from] tobj::LoadError),
}

/// A 3D model loaded once and instantiated into the scene on demand.
///
/// The loaded node tree is kept as a prototype;
/// [`instantiate`](ModelAsset::instantiate) hands out deep copies that share
/// the underlying mesh data.
pub struct ModelAsset {
    prototype: Node,
}

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

impl ModelAsset {
    /// Loads an OBJ file, with materials from its MTL file when present.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let (models, materials) = tobj::load_obj(path, &load_options())?;
        let materials = materials.unwrap_or_else(|_| {
            log::warn!("no MTL file for {}, using default material", path.display());
            Vec::new()
        });

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        log::info!(
            "loaded model {} ({} meshes, {} materials)",
            path.display(),
            models.len(),
            materials.len()
        );

        Ok(Self {
            prototype: build_prototype(&name, &models, &materials),
        })
    }

    /// Parses OBJ source directly. Material libraries are not resolved.
    pub fn from_obj_text(name: &str, text: &str) -> Result<Self, AssetError> {
        let mut reader = std::io::BufReader::new(text.as_bytes());
        let (models, _) = tobj::load_obj_buf(&mut reader, &load_options(), |_| {
            Ok((Vec::new(), Default::default()))
        })?;
        Ok(Self {
            prototype: build_prototype(name, &models, &[]),
        })
    }

    /// A fresh copy of the model's node tree, sharing mesh data with every
    /// other instance.
    pub fn instantiate(&self) -> Node {
        self.prototype.clone_subtree()
    }
}

fn build_prototype(name: &str, models: &[tobj::Model], materials: &[tobj::Material]) -> Node {
    let mut root = Node::new(name);

    for (i, model) in models.iter().enumerate() {
        let mesh = &model.mesh;

        // Use normals from the OBJ when present, otherwise compute them.
        let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
            mesh.normals.clone()
        } else {
            MeshData::face_normals(&mesh.positions, &mesh.indices)
        };

        let data = MeshData::new(mesh.positions.clone(), normals, mesh.indices.clone());
        let child_name = if model.name.is_empty() {
            format!("mesh-{}", i)
        } else {
            model.name.clone()
        };
        let mut child = Node::with_geometry(child_name, Geometry::Mesh(Arc::new(data)));

        if let Some(material) = mesh.material_id.and_then(|id| materials.get(id)) {
            let diffuse = material.diffuse.unwrap_or([0.8, 0.8, 0.8]);
            let alpha = material.dissolve.unwrap_or(1.0);
            child.material = Material::new([diffuse[0], diffuse[1], diffuse[2], alpha]);
        }

        root.add_child(child);
    }

    root
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE_OBJ: &str = "\
o tri
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 0.0 -1.0
vn 0.0 1.0 0.0
f 1//1 2//1 3//1
";

    const NO_NORMALS_OBJ: &str = "\
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 0.0 -1.0
f 1 2 3
";

    #[test]
    fn obj_meshes_become_child_nodes() {
        let asset = ModelAsset::from_obj_text("tri", TRIANGLE_OBJ).unwrap();
        let node = asset.instantiate();

        assert_eq!(node.name, "tri");
        assert_eq!(node.children().len(), 1);

        let child = &node.children()[0];
        assert_eq!(child.name, "tri");
        let Some(Geometry::Mesh(mesh)) = &child.geometry else {
            panic!("expected mesh geometry");
        };
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn missing_normals_are_computed() {
        let asset = ModelAsset::from_obj_text("flat", NO_NORMALS_OBJ).unwrap();
        let node = asset.instantiate();
        let Some(Geometry::Mesh(mesh)) = &node.children()[0].geometry else {
            panic!("expected mesh geometry");
        };
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        // The triangle lies in the XZ plane, so its normal points up.
        assert!((mesh.normals[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn instances_share_mesh_data_but_not_ids() {
        let asset = ModelAsset::from_obj_text("tri", TRIANGLE_OBJ).unwrap();
        let a = asset.instantiate();
        let b = asset.instantiate();

        assert_ne!(a.id(), b.id());
        assert_ne!(a.children()[0].id(), b.children()[0].id());

        let (Some(Geometry::Mesh(ma)), Some(Geometry::Mesh(mb))) =
            (&a.children()[0].geometry, &b.children()[0].geometry)
        else {
            panic!("expected mesh geometry");
        };
        assert!(Arc::ptr_eq(ma, mb));
    }

    #[test]
    fn garbage_input_is_an_error() {
        // tobj tolerates unknown statements; an unresolvable face index is a
        // hard parse failure.
        assert!(ModelAsset::from_obj_text("bad", "f 1 2 9\n").is_err());
    }
}
