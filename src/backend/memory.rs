use std::collections::BTreeMap;

use crate::backend::{Backend, Edit, Editor};
use crate::error::Result;
use crate::schema::Value;

/// In-process backend with no durability. Used by tests and as a scratch store.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    values: BTreeMap<String, Value>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a backend with existing values, e.g. a store written by an older release.
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Apply a batch of edits to a map. Shared by every map-backed backend.
pub(crate) fn apply_edits(values: &mut BTreeMap<String, Value>, editor: Editor) {
    for edit in editor.into_edits() {
        match edit {
            Edit::Put(key, value) => {
                values.insert(key, value);
            }
            Edit::Remove(key) => {
                values.remove(&key);
            }
        }
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn apply(&mut self, editor: Editor) -> Result<()> {
        apply_edits(&mut self.values, editor);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}
