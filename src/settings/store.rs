//! Key-value settings persistence
//!
//! Values are grouped by namespace, mirroring how desktop settings
//! backends are usually organised. Two implementations are provided: an
//! in-memory store and a JSON file that is rewritten on every change.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::Result;

/// Grouped key-value settings storage
pub trait SettingsStore: Send + Sync {
    /// Read `key` within `group`
    fn value(&self, group: &str, key: &str) -> Option<Value>;

    /// Write `key` within `group`, replacing any previous value
    fn set_value(&self, group: &str, key: &str, value: Value) -> Result<()>;
}

/// Volatile settings store
#[derive(Debug, Default)]
pub struct MemoryStore {
    groups: RwLock<HashMap<String, HashMap<String, Value>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn value(&self, group: &str, key: &str) -> Option<Value> {
        self.groups
            .read()
            .get(group)
            .and_then(|values| values.get(key))
            .cloned()
    }

    fn set_value(&self, group: &str, key: &str, value: Value) -> Result<()> {
        self.groups
            .write()
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Settings store backed by a JSON file
///
/// The file holds one object per group. It is read once on open and
/// rewritten in full on every `set_value`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    groups: RwLock<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`
    ///
    /// A missing, empty or unreadable-as-JSON file starts out empty; the
    /// next write replaces it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let groups = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            parse_groups(&path, &raw)
        } else {
            Map::new()
        };

        tracing::debug!(path = %path.display(), groups = groups.len(), "Settings store opened");

        Ok(Self {
            path,
            groups: RwLock::new(groups),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling path the payload is staged in before the rename
    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }

    /// Replace the file with `groups`; the old file stays intact until the
    /// new payload is fully written
    fn write_file(&self, groups: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let payload = serde_json::to_string_pretty(groups)?;
        let staging = self.staging_path();

        let written = fs::File::create(&staging)
            .and_then(|mut file| {
                file.write_all(payload.as_bytes())?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&staging, &self.path));

        if let Err(e) = written {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        Ok(())
    }
}

fn parse_groups(path: &Path, raw: &str) -> Map<String, Value> {
    if raw.trim().is_empty() {
        return Map::new();
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            tracing::warn!(
                path = %path.display(),
                "Settings file is not a JSON object, starting empty"
            );
            Map::new()
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Settings file is corrupt, starting empty"
            );
            Map::new()
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn value(&self, group: &str, key: &str) -> Option<Value> {
        self.groups
            .read()
            .get(group)
            .and_then(|values| values.get(key))
            .cloned()
    }

    fn set_value(&self, group: &str, key: &str, value: Value) -> Result<()> {
        let mut groups = self.groups.write();

        // Memory only changes once the file holds the new state
        let mut updated = groups.clone();
        let entry = updated
            .entry(group.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(values) = entry {
            values.insert(key.to_string(), value);
        }

        self.write_file(&updated)?;
        *groups = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_memory_store_groups_are_isolated() {
        let store = MemoryStore::new();

        store.set_value("a", "key", json!(1)).unwrap();
        store.set_value("b", "key", json!(2)).unwrap();

        assert_eq!(store.value("a", "key"), Some(json!(1)));
        assert_eq!(store.value("b", "key"), Some(json!(2)));
        assert_eq!(store.value("c", "key"), None);
    }

    #[test]
    fn test_memory_store_overwrites() {
        let store = MemoryStore::new();

        store.set_value("g", "k", json!("old")).unwrap();
        store.set_value("g", "k", json!("new")).unwrap();

        assert_eq!(store.value("g", "k"), Some(json!("new")));
    }

    #[test]
    fn test_file_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            assert_eq!(store.value("CameraManager", "streams"), None);
            store
                .set_value("CameraManager", "streams", json!("[]"))
                .unwrap();
            store
                .set_value("CameraManager", "primaryIndex", json!(2))
                .unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.path(), path.as_path());
        assert_eq!(
            reopened.value("CameraManager", "streams"),
            Some(json!("[]"))
        );
        assert_eq!(
            reopened.value("CameraManager", "primaryIndex"),
            Some(json!(2))
        );
    }

    #[test]
    fn test_file_store_non_object_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let store = JsonFileStore::open(&path).unwrap();

        assert_eq!(store.value("any", "key"), None);
    }

    #[test]
    fn test_file_store_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        // Valid prefix of a real settings file, cut off mid-write
        fs::write(
            &path,
            r#"{"CameraManager":{"primaryIndex":0,"streams":"[{\"name\":\"A\""#,
        )
        .unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.value("CameraManager", "streams"), None);
        assert_eq!(store.value("CameraManager", "primaryIndex"), None);

        store
            .set_value("CameraManager", "primaryIndex", json!(-1))
            .unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.value("CameraManager", "primaryIndex"),
            Some(json!(-1))
        );
    }

    #[test]
    fn test_file_store_write_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = JsonFileStore::open(&path).unwrap();

        store.set_value("g", "k", json!(1)).unwrap();
        store.set_value("g", "k", json!(2)).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("settings.json")]);
        assert_eq!(JsonFileStore::open(&path).unwrap().value("g", "k"), Some(json!(2)));
    }

    #[test]
    fn test_file_store_failed_write_keeps_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let store = JsonFileStore::open(blocker.join("settings.json")).unwrap();

        let result = store.set_value("g", "k", json!(1));

        assert!(matches!(result, Err(crate::Error::Io(_))));
        assert_eq!(store.value("g", "k"), None);
    }
}
