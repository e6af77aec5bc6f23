use crate::{transform::Transform, SceneError};

use super::SceneGraph;

/// Fresh parent-relative poses for the movable nodes of one simulation step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoseSnapshot {
    poses: Vec<(String, Transform)>,
}

impl PoseSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, transform: Transform) {
        self.poses.push((name.into(), transform));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Transform)> {
        self.poses
            .iter()
            .map(|(name, transform)| (name.as_str(), transform))
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Builds the snapshot from world poses indexed by node id, as the engine
    /// reports them after a step. Every movable node gets
    /// `local = invert(parent_world) ∘ child_world`.
    pub fn from_world_poses(graph: &SceneGraph, world: &[Transform]) -> Result<Self, SceneError> {
        if world.len() < graph.len() {
            return Err(SceneError::MalformedModel(format!(
                "{} world poses for {} nodes",
                world.len(),
                graph.len()
            )));
        }

        let mut snapshot = Self::new();
        for node in graph.movable() {
            let child_world = &world[node.id];
            let local = match node.parent {
                Some(parent) => world[parent].inverse().compose(child_world),
                None => *child_world,
            };
            snapshot.push(node.name.clone(), local);
        }
        Ok(snapshot)
    }
}

impl FromIterator<(String, Transform)> for PoseSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, Transform)>>(iter: T) -> Self {
        Self {
            poses: iter.into_iter().collect(),
        }
    }
}
