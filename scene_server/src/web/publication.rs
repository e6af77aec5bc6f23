use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use bytes::Bytes;
use scene_common::{
    coordinates::AxisConvention,
    protocol::{ObjectRecord, ServerMessage, VisualRecord, WireTransform},
    scene::{CompiledScene, GeometryKind, SceneNode, Visual},
    transform::Transform,
    ContentHash,
};
use ultraviolet::Rotor3;

use crate::ServerError;

/// Suffix of the child object that holds a body's mesh visuals.
pub const VISUALS_SUFFIX: &str = "/visuals";

/// A compiled scene as the viewers see it: catalog frames encoded once, and
/// the object list in creation order.
#[derive(Debug)]
pub struct Publication {
    scene: Arc<CompiledScene>,
    convention: AxisConvention,
    /// `RESET` followed by every catalog entry.
    catalog_frames: Vec<Arc<str>>,
    objects: Vec<ObjectRecord>,
    /// Names of objects whose transform may be updated.
    bodies: HashSet<String>,
}

impl Publication {
    pub fn new(
        scene: Arc<CompiledScene>,
        convention: AxisConvention,
        hidden_groups: &[i32],
    ) -> Result<Self, ServerError> {
        let mut catalog_frames = Vec::with_capacity(
            1 + scene.meshes.len() + scene.textures.len() + scene.materials.len(),
        );
        catalog_frames.push(encode(&ServerMessage::Reset)?);
        for mesh in scene.meshes.iter() {
            catalog_frames.push(encode(&ServerMessage::LoadMesh(mesh.clone()))?);
        }
        for texture in scene.textures.iter() {
            catalog_frames.push(encode(&ServerMessage::LoadTexture(texture.clone()))?);
        }
        for material in scene.materials.iter() {
            catalog_frames.push(encode(&ServerMessage::LoadMaterial(material.clone()))?);
        }

        let axis_node = Transform {
            orientation: convention.basis_rotation().unwrap_or_else(Rotor3::identity),
            ..Default::default()
        };
        let mut objects = Vec::with_capacity(scene.graph.len() * 2);
        let mut bodies = HashSet::with_capacity(scene.graph.len());
        for node in scene.graph.iter() {
            let parent = scene.graph.parent_of(node).map(|parent| parent.name.clone());
            let shown = node
                .visuals
                .iter()
                .filter(|visual| !hidden_groups.contains(&visual.group));

            let mut primitives = Vec::new();
            let mut meshes = Vec::new();
            for visual in shown {
                if visual.kind == GeometryKind::Mesh {
                    // Mesh vertices are in the engine frame, the axis node
                    // rotates them.
                    meshes.push(visual_record(visual, WireTransform::from(&visual.transform)));
                } else {
                    let transform = convention.convert_primitive(&visual.transform, visual.kind);
                    primitives.push(visual_record(visual, WireTransform::from(&transform)));
                }
            }

            objects.push(ObjectRecord {
                name: node.name.clone(),
                parent,
                transform: WireTransform::from(&convention.convert(&node.transform)),
                visuals: primitives,
            });
            objects.push(ObjectRecord {
                name: visuals_node_name(node),
                parent: Some(node.name.clone()),
                transform: WireTransform::from(&axis_node),
                visuals: meshes,
            });
            bodies.insert(node.name.clone());
        }

        Ok(Self {
            scene,
            convention,
            catalog_frames,
            objects,
            bodies,
        })
    }

    pub fn scene(&self) -> &Arc<CompiledScene> {
        &self.scene
    }

    pub fn id(&self) -> ContentHash {
        self.scene.id
    }

    pub fn objects(&self) -> &[ObjectRecord] {
        &self.objects
    }

    pub fn contains_body(&self, name: &str) -> bool {
        self.bodies.contains(name)
    }

    pub fn asset(&self, key: &str) -> Option<Bytes> {
        self.scene.assets.get_by_key(key)
    }

    pub fn wire_transform(&self, transform: &Transform) -> WireTransform {
        WireTransform::from(&self.convention.convert(transform))
    }

    /// Every frame a fresh client needs, in order. Bodies that moved since the
    /// scene was published are created at their latest pose.
    pub fn handshake(
        &self,
        current: &HashMap<String, Transform>,
    ) -> Result<Vec<Arc<str>>, ServerError> {
        let mut frames = self.catalog_frames.clone();
        frames.reserve(self.objects.len());
        for object in self.objects.iter() {
            let mut object = object.clone();
            if let Some(transform) = current.get(&object.name) {
                object.transform = self.wire_transform(transform);
            }
            frames.push(encode(&ServerMessage::CreateObject(object))?);
        }
        Ok(frames)
    }
}

pub fn visuals_node_name(node: &SceneNode) -> String {
    format!("{}{VISUALS_SUFFIX}", node.name)
}

fn visual_record(visual: &Visual, transform: WireTransform) -> VisualRecord {
    VisualRecord {
        name: visual.name.clone(),
        kind: visual.kind,
        mesh: visual.mesh.clone(),
        material: visual.material.clone(),
        transform,
    }
}

pub(crate) fn encode(message: &ServerMessage) -> Result<Arc<str>, ServerError> {
    Ok(Arc::from(message.encode()?))
}
