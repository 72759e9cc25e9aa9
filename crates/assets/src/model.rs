use crate::AssetError;
use glam::Mat4;
use hologram_common::NodeId;
use hologram_scene::{
    Geometry, Material, MaterialHandle, MaterialLibrary, Node, Scene, StandardMaterial,
};
use std::path::Path;

/// One drawable primitive pulled out of a model file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedMesh {
    pub name: String,
    /// Vertex data already in model space (node transforms baked in).
    pub geometry: Geometry,
    /// Index into [`ModelData::materials`].
    pub material: Option<usize>,
}

/// A model as loaded from disk, not yet part of any scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelData {
    pub name: String,
    pub meshes: Vec<ImportedMesh>,
    pub materials: Vec<StandardMaterial>,
}

impl ModelData {
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.geometry.vertex_count()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.geometry.triangle_count()).sum()
    }

    /// Turn the model into a detached subtree: one group node with a mesh
    /// child per imported mesh. Materials are registered in `materials`.
    ///
    /// The returned group is not attached to the root.
    pub fn instantiate(
        self,
        scene: &mut Scene,
        materials: &mut MaterialLibrary,
    ) -> Result<NodeId, AssetError> {
        let handles: Vec<MaterialHandle> = self
            .materials
            .into_iter()
            .map(|m| materials.add(Material::Standard(m)))
            .collect();
        let mut fallback = None;

        let root = scene.insert(Node::group(self.name));
        for mesh in self.meshes {
            let handle = match mesh.material.and_then(|i| handles.get(i)) {
                Some(h) => *h,
                None => *fallback.get_or_insert_with(|| {
                    materials.add(Material::Standard(StandardMaterial::default()))
                }),
            };
            scene.add_child(root, Node::mesh(mesh.name, mesh.geometry, handle))?;
        }
        Ok(root)
    }
}

/// Import a glTF or GLB file from disk.
pub fn import_gltf(path: impl AsRef<Path>) -> Result<ModelData, AssetError> {
    let path = path.as_ref();
    let (document, buffers, _images) = gltf::import(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("model")
        .to_string();
    let model = convert(name, &document, &buffers)?;
    tracing::info!(
        path = %path.display(),
        meshes = model.mesh_count(),
        vertices = model.vertex_count(),
        "model imported"
    );
    Ok(model)
}

fn convert(
    name: String,
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<ModelData, AssetError> {
    let materials = document
        .materials()
        .enumerate()
        .map(|(i, m)| StandardMaterial {
            name: m.name().map(str::to_string).unwrap_or_else(|| format!("material_{i}")),
            base_color: m.pbr_metallic_roughness().base_color_factor(),
        })
        .collect();

    let scenes: Vec<gltf::Scene> = match document.default_scene() {
        Some(scene) => vec![scene],
        None => document.scenes().collect(),
    };

    let mut meshes = Vec::new();
    for scene in scenes {
        for node in scene.nodes() {
            process_node(&node, Mat4::IDENTITY, buffers, &mut meshes)?;
        }
    }

    Ok(ModelData {
        name,
        meshes,
        materials,
    })
}

/// Collect the meshes of a node and its children recursively.
fn process_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    meshes: &mut Vec<ImportedMesh>,
) -> Result<(), AssetError> {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh
            .name()
            .or_else(|| node.name())
            .unwrap_or("unnamed")
            .to_string();

        for (i, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                tracing::warn!(mesh = %mesh_name, mode = ?primitive.mode(), "skipping non-triangle primitive");
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or_else(|| AssetError::MissingPositions(mesh_name.clone()))?
                .collect();
            let normals = reader.read_normals().map(|n| n.collect());
            let indices = reader.read_indices().map(|i| i.into_u32().collect());

            let geometry = Geometry::new(positions, normals, indices).transformed(world);
            let name = if mesh.primitives().len() > 1 {
                format!("{mesh_name}_{i}")
            } else {
                mesh_name.clone()
            };
            meshes.push(ImportedMesh {
                name,
                geometry,
                material: primitive.material().index(),
            });
        }
    }

    for child in node.children() {
        process_node(&child, world, buffers, meshes)?;
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const TWO_NODE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 1] }],
        "nodes": [
            { "name": "left", "mesh": 0, "translation": [-2.0, 0.0, 0.0] },
            { "name": "right", "mesh": 0, "translation": [2.0, 0.0, 0.0] }
        ],
        "meshes": [{
            "name": "tri",
            "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }]
        }],
        "materials": [{
            "name": "paint",
            "pbrMetallicRoughness": { "baseColorFactor": [1.0, 0.0, 0.0, 1.0] }
        }],
        "buffers": [{ "uri": "mesh.bin", "byteLength": 42 }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
        ],
        "accessors": [
            {
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    }"#;

    fn triangle_bin() -> Vec<u8> {
        let mut bytes = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        for i in [0u16, 1, 2] {
            bytes.extend_from_slice(&i.to_le_bytes());
        }
        bytes
    }

    /// Writes a two-node triangle model into `dir` and returns the `.gltf` path.
    pub(crate) fn write_fixture(dir: &Path) -> std::path::PathBuf {
        std::fs::write(dir.join("mesh.bin"), triangle_bin()).unwrap();
        let path = dir.join("scene.gltf");
        std::fs::write(&path, TWO_NODE_GLTF).unwrap();
        path
    }

    #[test]
    fn import_bakes_node_transforms() {
        let dir = tempfile::tempdir().unwrap();
        let model = import_gltf(write_fixture(dir.path())).unwrap();

        assert_eq!(model.name, "scene");
        assert_eq!(model.mesh_count(), 2);
        assert_eq!(model.vertex_count(), 6);
        assert_eq!(model.triangle_count(), 2);
        assert_eq!(model.meshes[0].geometry.positions[0], [-2.0, 0.0, 0.0]);
        assert_eq!(model.meshes[1].geometry.positions[1], [3.0, 0.0, 0.0]);
        assert_eq!(model.meshes[0].geometry.normals[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn import_reads_materials() {
        let dir = tempfile::tempdir().unwrap();
        let model = import_gltf(write_fixture(dir.path())).unwrap();
        assert_eq!(model.materials.len(), 1);
        assert_eq!(model.materials[0].name, "paint");
        assert_eq!(model.materials[0].base_color, [1.0, 0.0, 0.0, 1.0]);
        assert!(model.meshes.iter().all(|m| m.material == Some(0)));
    }

    #[test]
    fn import_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(import_gltf(dir.path().join("absent.gltf")).is_err());
    }

    #[test]
    fn instantiate_builds_detached_group() {
        let dir = tempfile::tempdir().unwrap();
        let model = import_gltf(write_fixture(dir.path())).unwrap();

        let mut scene = Scene::new();
        let mut materials = MaterialLibrary::new();
        let root = model.instantiate(&mut scene, &mut materials).unwrap();

        assert!(!scene.is_attached(root));
        assert_eq!(scene.get(root).unwrap().children().len(), 2);
        assert_eq!(materials.len(), 1);

        let mut handles = Vec::new();
        scene.for_each_mesh_mut(root, |_, mesh| handles.push(mesh.material));
        assert_eq!(handles.len(), 2);
        assert_eq!(handles[0], handles[1]);
    }

    #[test]
    fn instantiate_uses_fallback_material() {
        let model = ModelData {
            name: "bare".into(),
            meshes: vec![ImportedMesh {
                name: "m".into(),
                geometry: Geometry::default(),
                material: None,
            }],
            materials: Vec::new(),
        };
        let mut scene = Scene::new();
        let mut materials = MaterialLibrary::new();
        model.instantiate(&mut scene, &mut materials).unwrap();
        assert_eq!(materials.len(), 1);
    }
}
