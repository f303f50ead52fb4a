use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::backend::memory::apply_edits;
use crate::backend::{Backend, Editor};
use crate::error::{PrefsError, Result};
use crate::schema::Value;

/// JSON-file backend. The whole map is kept in memory and rewritten
/// atomically after every applied batch.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl FileBackend {
    /// Load the store file. A missing file opens as an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let values: BTreeMap<String, Value> = if path.exists() {
            let raw = std::fs::read(path)?;
            serde_json::from_slice(&raw).map_err(|e| PrefsError::CorruptStore(e.to_string()))?
        } else {
            BTreeMap::new()
        };

        info!(path = ?path, keys = values.len(), "Preference store opened");
        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    /// Write `values` atomically: temp file, fsync, rename. The temp file is
    /// removed if any step fails.
    fn persist(&self, values: &BTreeMap<String, Value>) -> Result<()> {
        let json = serde_json::to_vec_pretty(values)
            .map_err(|e| PrefsError::Serialization(e.to_string()))?;

        let parent = self
            .path
            .parent()
            .ok_or_else(|| PrefsError::Config("Store has no parent directory.".into()))?;
        std::fs::create_dir_all(parent)?;

        let tmp_path = parent.join(format!(".prefs.tmp.{}", rand::random::<u64>()));

        let written = write_synced(&tmp_path, &json)
            .and_then(|()| std::fs::rename(&tmp_path, &self.path));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        debug!(path = ?self.path, "Preference store persisted");
        Ok(())
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = std::fs::File::create(path)?;
    tmp.write_all(bytes)?;
    tmp.sync_all()
}

impl Backend for FileBackend {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn apply(&mut self, editor: Editor) -> Result<()> {
        if editor.is_empty() {
            return Ok(());
        }
        // Only adopt the edited map once it is on disk.
        let mut next = self.values.clone();
        apply_edits(&mut next, editor);
        self.persist(&next)?;
        self.values = next;
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::open(&dir.path().join("prefs.json")).unwrap();
        assert!(backend.keys().is_empty());
        assert!(!dir.path().join("prefs.json").exists());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");

        let mut backend = FileBackend::open(&path).unwrap();
        backend
            .apply(
                Editor::new()
                    .put_string("username", "gaben")
                    .put_int("hours_until_drops", 5)
                    .put_bool("offline", true),
            )
            .unwrap();

        let reopened = FileBackend::open(&path).unwrap();
        assert_eq!(reopened.get_string("username", ""), "gaben");
        assert_eq!(reopened.get_int("hours_until_drops", 3), 5);
        assert!(reopened.get_bool("offline", false));
    }

    #[test]
    fn test_read_after_write_sees_value() {
        let dir = TempDir::new().unwrap();
        let mut backend = FileBackend::open(&dir.path().join("prefs.json")).unwrap();
        backend.apply(Editor::new().put_string("k", "v")).unwrap();
        assert_eq!(backend.get_string("k", ""), "v");
    }

    #[test]
    fn test_corrupt_file_returns_err() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, b"{not json").unwrap();

        let err = FileBackend::open(&path).unwrap_err();
        assert!(matches!(err, PrefsError::CorruptStore(_)));
    }

    #[test]
    fn test_failed_write_keeps_previous_value() {
        let dir = TempDir::new().unwrap();
        let store_dir = dir.path().join("store");
        std::fs::create_dir_all(&store_dir).unwrap();
        let path = store_dir.join("prefs.json");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.apply(Editor::new().put_string("password", "old")).unwrap();

        // Replace the store directory with a plain file so the next write fails.
        std::fs::remove_dir_all(&store_dir).unwrap();
        std::fs::write(&store_dir, b"not a directory").unwrap();

        let result = backend.apply(Editor::new().put_string("password", "new"));
        assert!(matches!(result, Err(PrefsError::Io(_))));
        assert_eq!(backend.get_string("password", ""), "old");
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        let mut backend = FileBackend::open(&path).unwrap();

        // A non-empty directory at the store path makes the rename fail.
        std::fs::create_dir_all(path.join("blocker")).unwrap();

        assert!(backend.apply(Editor::new().put_int("version", 2)).is_err());
        assert!(!backend.contains("version"));

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["prefs.json"]);
    }

    #[test]
    fn test_unexpected_values_read_as_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(
            &path,
            r#"{"hours_until_drops":2.5,"version":99999999999,"username":"gaben"}"#,
        )
        .unwrap();

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.get_int("hours_until_drops", 3), 3);
        assert_eq!(backend.get_int("version", 1), 1);
        assert_eq!(backend.get_string("username", ""), "gaben");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let mut backend = FileBackend::open(&dir.path().join("prefs.json")).unwrap();
        backend.apply(Editor::new().put_int("version", 2)).unwrap();
        backend.apply(Editor::new().remove("version")).unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["prefs.json"]);
    }
}
