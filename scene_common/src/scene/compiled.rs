use std::sync::Arc;

use crate::{AssetStore, ContentHash, SceneError};

use super::{MaterialEntry, MeshEntry, SceneGraph, TextureEntry};

/// Everything one compile produced. Immutable once built; a recompile makes a
/// new one.
#[derive(Debug)]
pub struct CompiledScene {
    /// Hash of the serialized object tree.
    pub id: ContentHash,
    pub graph: SceneGraph,
    pub meshes: Vec<MeshEntry>,
    pub materials: Vec<MaterialEntry>,
    pub textures: Vec<TextureEntry>,
    pub assets: Arc<AssetStore>,
}

impl CompiledScene {
    pub fn mesh(&self, name: &str) -> Option<&MeshEntry> {
        self.meshes.iter().find(|mesh| mesh.name == name)
    }

    pub fn material(&self, name: &str) -> Option<&MaterialEntry> {
        self.materials.iter().find(|material| material.name == name)
    }

    pub fn texture(&self, name: &str) -> Option<&TextureEntry> {
        self.textures.iter().find(|texture| texture.name == name)
    }

    /// Checks that every name and hash used anywhere in the scene resolves.
    pub fn validate_references(&self) -> Result<(), SceneError> {
        for (node, visual) in self.graph.visuals() {
            let owner = || format!("{}/{}", node.name, visual.name);
            if let Some(mesh) = &visual.mesh {
                if self.mesh(mesh).is_none() {
                    return Err(dangling(owner(), "mesh", mesh));
                }
            }
            if let Some(material) = &visual.material {
                if self.material(material).is_none() {
                    return Err(dangling(owner(), "material", material));
                }
            }
        }

        for material in &self.materials {
            if let Some(texture) = &material.texture {
                if self.texture(texture).is_none() {
                    return Err(dangling(material.name.clone(), "texture", texture));
                }
            }
        }

        let blobs = self
            .meshes
            .iter()
            .map(|mesh| (&mesh.name, &mesh.hash))
            .chain(self.textures.iter().map(|texture| (&texture.name, &texture.hash)));
        for (name, hash) in blobs {
            if !self.assets.contains(hash) {
                return Err(dangling(name.clone(), "asset", &hash.to_string()));
            }
        }
        Ok(())
    }
}

fn dangling(owner: String, what: &'static str, name: &str) -> SceneError {
    SceneError::DanglingReference {
        owner,
        what,
        name: name.to_string(),
    }
}
