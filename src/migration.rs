//! Schema upgrades between releases.
//!
//! Only the final version number is persisted, never which steps ran, so
//! every step must leave the store correct when re-applied after a crash.

use tracing::{debug, info, warn};

use crate::backend::{Backend, Editor};
use crate::error::{PrefsError, Result};
use crate::schema::{Literal, LAST_SESSION, VERSION};

pub const CURRENT_VERSION: i32 = 2;

#[derive(Clone, Copy)]
pub enum Step {
    /// Overwrite a key with a fixed value.
    ResetField { key: &'static str, value: Literal },
    /// Move a value to a new key. An existing value under `to` wins.
    RenameKey { from: &'static str, to: &'static str },
    /// Arbitrary rewrite. Must be idempotent.
    Recompute(fn(&mut dyn Backend) -> Result<()>),
}

impl Step {
    fn apply(&self, backend: &mut dyn Backend) -> Result<()> {
        match *self {
            Step::ResetField { key, value } => {
                backend.apply(Editor::new().put(key, value.to_value()))
            }
            Step::RenameKey { from, to } => {
                let Some(value) = backend.get(from) else {
                    return Ok(());
                };
                let mut editor = Editor::new();
                if !backend.contains(to) {
                    editor = editor.put(to, value);
                }
                backend.apply(editor.remove(from))
            }
            Step::Recompute(f) => f(backend),
        }
    }
}

#[derive(Clone, Copy)]
pub struct Migration {
    /// The schema version this step brings the store up to.
    pub version: i32,
    pub name: &'static str,
    pub step: Step,
}

/// Every historical upgrade, in ascending version order.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 2,
    // Game's serialized field names changed; old snapshots cannot be read.
    name: "reset-last-session",
    step: Step::ResetField {
        key: LAST_SESSION.key,
        value: Literal::Str("[]"),
    },
}];

/// Bring the store to [`CURRENT_VERSION`]. Returns whether an upgrade ran.
///
/// Calling this on an up-to-date store is a no-op.
pub fn initialize(backend: &mut dyn Backend) -> Result<bool> {
    let stored = backend.get_int(VERSION.key, VERSION.default);
    if stored == CURRENT_VERSION {
        debug!(version = stored, "Preference schema is current");
        return Ok(false);
    }
    upgrade(backend, stored)?;
    Ok(true)
}

/// Apply every migration newer than `old_version`, then record the current version.
pub fn upgrade(backend: &mut dyn Backend, old_version: i32) -> Result<()> {
    run(backend, MIGRATIONS, old_version, CURRENT_VERSION)
}

fn run(
    backend: &mut dyn Backend,
    migrations: &[Migration],
    old_version: i32,
    target: i32,
) -> Result<()> {
    if old_version > target {
        warn!(
            stored = old_version,
            current = target,
            "Preference store was written by a newer release; resetting version marker"
        );
    } else {
        info!(from = old_version, to = target, "Upgrading preference schema");
    }

    for migration in migrations
        .iter()
        .filter(|m| m.version > old_version && m.version <= target)
    {
        debug!(version = migration.version, step = migration.name, "Applying migration");
        migration.step.apply(backend).map_err(|e| {
            PrefsError::Initialization(format!("migration '{}' failed: {}", migration.name, e))
        })?;
    }

    backend
        .apply(Editor::new().put_int(VERSION.key, target))
        .map_err(|e| PrefsError::Initialization(format!("could not record schema version: {}", e)))?;

    info!(version = target, "Preference schema upgraded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::schema::{Value, HOURS_UNTIL_DROPS};

    /// Reads work, every write fails.
    struct ReadOnlyBackend(MemoryBackend);

    impl Backend for ReadOnlyBackend {
        fn get(&self, key: &str) -> Option<Value> {
            self.0.get(key)
        }

        fn apply(&mut self, _editor: Editor) -> Result<()> {
            Err(PrefsError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }

        fn keys(&self) -> Vec<String> {
            self.0.keys()
        }
    }

    #[test]
    fn test_migration_table_is_ordered_and_ends_at_current() {
        let versions: Vec<i32> = MIGRATIONS.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(versions, sorted);
        assert!(versions.iter().all(|v| *v > 1 && *v <= CURRENT_VERSION));
    }

    #[test]
    fn test_fresh_store_is_stamped_with_current_version() {
        let mut backend = MemoryBackend::new();
        assert!(initialize(&mut backend).unwrap());
        assert_eq!(backend.get_int(VERSION.key, 1), CURRENT_VERSION);
    }

    #[test]
    fn test_v1_store_resets_last_session() {
        let mut backend = MemoryBackend::with_values([
            ("version", Value::Int(1)),
            ("last_session", Value::Str(r#"[{"id":1,"title":"old"}]"#.into())),
            ("username", Value::Str("gaben".into())),
        ]);

        assert!(initialize(&mut backend).unwrap());

        assert_eq!(backend.get_int(VERSION.key, 1), CURRENT_VERSION);
        assert_eq!(backend.get_string(LAST_SESSION.key, ""), "[]");
        assert_eq!(backend.get_string("username", ""), "gaben");
    }

    #[test]
    fn test_second_initialize_is_noop() {
        let mut backend = MemoryBackend::with_values([("version", Value::Int(1))]);
        assert!(initialize(&mut backend).unwrap());

        backend
            .apply(Editor::new().put_string(LAST_SESSION.key, r#"[{"appid":10,"name":"CS"}]"#))
            .unwrap();
        let before = backend.clone();

        assert!(!initialize(&mut backend).unwrap());
        assert_eq!(backend.keys(), before.keys());
        assert_eq!(
            backend.get_string(LAST_SESSION.key, ""),
            r#"[{"appid":10,"name":"CS"}]"#
        );
        assert_eq!(backend.get_int(VERSION.key, 1), CURRENT_VERSION);
    }

    #[test]
    fn test_newer_store_is_stamped_back_without_steps() {
        let mut backend = MemoryBackend::with_values([
            ("version", Value::Int(CURRENT_VERSION + 5)),
            ("last_session", Value::Str("keep".into())),
        ]);
        assert!(initialize(&mut backend).unwrap());
        assert_eq!(backend.get_int(VERSION.key, 1), CURRENT_VERSION);
        assert_eq!(backend.get_string(LAST_SESSION.key, ""), "keep");
    }

    #[test]
    fn test_steps_run_only_above_old_version() {
        let migrations = [
            Migration {
                version: 2,
                name: "two",
                step: Step::ResetField {
                    key: "a",
                    value: Literal::Int(2),
                },
            },
            Migration {
                version: 3,
                name: "three",
                step: Step::ResetField {
                    key: "b",
                    value: Literal::Int(3),
                },
            },
        ];
        let mut backend = MemoryBackend::new();
        run(&mut backend, &migrations, 2, 3).unwrap();

        assert!(!backend.contains("a"));
        assert_eq!(backend.get_int("b", 0), 3);
        assert_eq!(backend.get_int(VERSION.key, 1), 3);
    }

    #[test]
    fn test_rename_key_is_idempotent() {
        let step = Step::RenameKey {
            from: "hours",
            to: HOURS_UNTIL_DROPS.key,
        };
        let mut backend = MemoryBackend::with_values([("hours", Value::Int(6))]);

        step.apply(&mut backend).unwrap();
        step.apply(&mut backend).unwrap();

        assert!(!backend.contains("hours"));
        assert_eq!(backend.get_int(HOURS_UNTIL_DROPS.key, 3), 6);
    }

    #[test]
    fn test_rename_key_keeps_existing_target() {
        let step = Step::RenameKey {
            from: "hours",
            to: HOURS_UNTIL_DROPS.key,
        };
        let mut backend = MemoryBackend::with_values([
            ("hours", Value::Int(6)),
            (HOURS_UNTIL_DROPS.key, Value::Int(1)),
        ]);

        step.apply(&mut backend).unwrap();

        assert!(!backend.contains("hours"));
        assert_eq!(backend.get_int(HOURS_UNTIL_DROPS.key, 3), 1);
    }

    #[test]
    fn test_recompute_step_runs() {
        fn clamp_hours(backend: &mut dyn Backend) -> Result<()> {
            let hours = backend.get_int(HOURS_UNTIL_DROPS.key, HOURS_UNTIL_DROPS.default);
            backend.apply(Editor::new().put_int(HOURS_UNTIL_DROPS.key, hours.clamp(1, 24)))
        }

        let mut backend = MemoryBackend::with_values([(HOURS_UNTIL_DROPS.key, Value::Int(99))]);
        let step = Step::Recompute(clamp_hours);
        step.apply(&mut backend).unwrap();
        step.apply(&mut backend).unwrap();
        assert_eq!(backend.get_int(HOURS_UNTIL_DROPS.key, 3), 24);
    }

    #[test]
    fn test_unwritable_store_fails_initialization() {
        let mut backend = ReadOnlyBackend(MemoryBackend::with_values([("version", Value::Int(1))]));
        let err = initialize(&mut backend).unwrap_err();
        assert!(matches!(err, PrefsError::Initialization(_)));
    }

    #[test]
    fn test_current_read_only_store_initializes() {
        let mut backend = ReadOnlyBackend(MemoryBackend::with_values([(
            "version",
            Value::Int(CURRENT_VERSION),
        )]));
        assert!(!initialize(&mut backend).unwrap());
    }
}
