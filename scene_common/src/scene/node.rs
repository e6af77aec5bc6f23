use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::transform::Transform;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GeometryKind {
    Cube,
    Sphere,
    Capsule,
    Cylinder,
    Plane,
    Quad,
    Mesh,
    None,
}

impl GeometryKind {
    pub fn is_primitive(&self) -> bool {
        !matches!(self, GeometryKind::Mesh | GeometryKind::None)
    }
}

/// A piece of geometry attached to a node.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Visual {
    pub name: String,
    pub kind: GeometryKind,
    pub mesh: Option<String>,
    pub material: Option<String>,
    /// For primitives the scale holds the engine's size parameters, meshes
    /// have unit scale.
    pub transform: Transform,
    /// Used to keep collision-only or debug geometry out of the stream.
    pub group: i32,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SceneNode {
    pub id: usize,
    pub name: String,
    pub parent: Option<usize>,
    /// Relative to the parent node.
    pub transform: Transform,
    /// True iff the engine attaches at least one joint with a degree of freedom.
    pub movable: bool,
    pub visuals: Vec<Visual>,
    pub children: Vec<usize>,
}

/// Tree of bodies, stored flat. Node ids are indices and every parent comes
/// before its children.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SceneGraph {
    nodes: Vec<SceneNode>,
    #[serde(skip)]
    by_name: HashMap<String, usize>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node under `parent`. Returns its id.
    ///
    /// Panics if `parent` has not been added yet, since that would break the
    /// parent-before-child order.
    pub fn push(
        &mut self,
        name: String,
        parent: Option<usize>,
        transform: Transform,
        movable: bool,
    ) -> usize {
        let id = self.nodes.len();
        if let Some(parent) = parent {
            assert!(parent < id, "parent {parent} must precede child {id}");
            self.nodes[parent].children.push(id);
        }
        self.by_name.insert(name.clone(), id);
        self.nodes.push(SceneNode {
            id,
            name,
            parent,
            transform,
            movable,
            visuals: Vec::new(),
            children: Vec::new(),
        });
        id
    }

    pub fn attach_visual(&mut self, node: usize, visual: Visual) {
        self.nodes[node].visuals.push(visual);
    }

    pub fn root(&self) -> Option<&SceneNode> {
        self.nodes.first()
    }

    pub fn get(&self, id: usize) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        self.by_name.get(name).and_then(|id| self.nodes.get(*id))
    }

    pub fn parent_of(&self, node: &SceneNode) -> Option<&SceneNode> {
        node.parent.and_then(|parent| self.nodes.get(parent))
    }

    /// Parent-before-child order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter()
    }

    pub fn movable(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.iter().filter(|node| node.movable)
    }

    pub fn visuals(&self) -> impl Iterator<Item = (&SceneNode, &Visual)> {
        self.nodes
            .iter()
            .flat_map(|node| node.visuals.iter().map(move |visual| (node, visual)))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
