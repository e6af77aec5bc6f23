use std::collections::{BTreeMap, HashMap};

use scene_common::transform::Transform;

/// Objects whose transform changed since the last flush, with the latest value
/// for each.
#[derive(Debug, Default)]
pub struct DirtySet {
    entries: HashMap<String, Transform>,
}

impl DirtySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later marks of the same object overwrite earlier ones.
    pub fn mark(&mut self, name: &str, transform: Transform) {
        self.entries.insert(name.to_string(), transform);
    }

    /// Empties the set. Sorted by name so every client sees the same payload.
    pub fn take(&mut self) -> BTreeMap<String, Transform> {
        self.entries.drain().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
