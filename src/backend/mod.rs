pub mod file;
pub mod memory;

use tracing::warn;

use crate::error::Result;
use crate::schema::Value;

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// A single pending change to the backing store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Put(String, Value),
    Remove(String),
}

/// A batch of edits applied together by [`Backend::apply`].
#[derive(Debug, Default)]
pub struct Editor {
    edits: Vec<Edit>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(mut self, key: &str, value: Value) -> Self {
        self.edits.push(Edit::Put(key.to_string(), value));
        self
    }

    pub fn put_string(self, key: &str, value: impl Into<String>) -> Self {
        self.put(key, Value::Str(value.into()))
    }

    pub fn put_int(self, key: &str, value: i32) -> Self {
        self.put(key, Value::Int(value))
    }

    pub fn put_bool(self, key: &str, value: bool) -> Self {
        self.put(key, Value::Bool(value))
    }

    pub fn remove(mut self, key: &str) -> Self {
        self.edits.push(Edit::Remove(key.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn into_edits(self) -> Vec<Edit> {
        self.edits
    }
}

/// Durable key-value substrate for preferences.
///
/// Reads are synchronous and see every previously applied edit. Typed reads
/// are total: an absent key, or a value of the wrong kind, yields the default.
pub trait Backend {
    fn get(&self, key: &str) -> Option<Value>;

    /// Apply every edit in the batch, then persist.
    fn apply(&mut self, editor: Editor) -> Result<()>;

    /// All stored keys, sorted.
    fn keys(&self) -> Vec<String>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn get_string(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(Value::Str(s)) => s,
            Some(other) => {
                warn!(key, found = %other, "Stored value is not a string, using default");
                default.to_string()
            }
            None => default.to_string(),
        }
    }

    fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.get(key) {
            Some(Value::Int(i)) => i,
            Some(other) => {
                warn!(key, found = %other, "Stored value is not an int, using default");
                default
            }
            None => default,
        }
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => b,
            Some(other) => {
                warn!(key, found = %other, "Stored value is not a bool, using default");
                default
            }
            None => default,
        }
    }
}
