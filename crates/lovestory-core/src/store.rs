use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Session token key
pub const TOKEN_KEY: &str = "token";
/// Cached profile of the signed-in user
pub const USER_KEY: &str = "user";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key-value settings shared by reference between the HTTP client and the CLI.
///
/// In-memory, or backed by a JSON file rewritten on every change.
#[derive(Debug, Default)]
pub struct SettingsStore {
    values: Mutex<BTreeMap<String, Value>>,
    path: Option<PathBuf>,
}

impl SettingsStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed store, loading existing values if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            serde_json::from_reader(reader)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            values: Mutex::new(values),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        self.get(key).map(serde_json::from_value).transpose().map_err(StoreError::from)
    }

    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        self.update(|values| {
            values.insert(key.to_string(), value);
            true
        })
    }

    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|values| values.remove(key).is_some())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.update(|values| {
            values.clear();
            true
        })
    }

    /// Apply `change` to a copy, persist it, and only then swap it in, so a
    /// failed write leaves memory matching the file. `change` returns whether
    /// anything changed.
    fn update(&self, change: impl FnOnce(&mut BTreeMap<String, Value>) -> bool) -> Result<(), StoreError> {
        let mut values = self.lock();
        let mut next = values.clone();
        if !change(&mut next) {
            return Ok(());
        }
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.get_string(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn set_token(&self, token: &str) -> Result<(), StoreError> {
        self.set(TOKEN_KEY, token)
    }

    pub fn clear_token(&self) -> Result<(), StoreError> {
        self.remove(TOKEN_KEY)
    }

    fn persist(&self, values: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("tmp");
        let writer = BufWriter::new(File::create(&temp_path)?);
        serde_json::to_writer_pretty(writer, values)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        id: i64,
        username: String,
    }

    #[test]
    fn test_in_memory_get_set_clear() {
        let store = SettingsStore::in_memory();
        assert!(store.token().is_none());

        store.set_token("abc").unwrap();
        assert_eq!(store.token().as_deref(), Some("abc"));

        store.set("theme", "rose").unwrap();
        store.clear_token().unwrap();
        assert!(store.token().is_none());
        assert_eq!(store.get_string("theme").as_deref(), Some("rose"));

        store.clear().unwrap();
        assert!(store.get("theme").is_none());
    }

    #[test]
    fn test_typed_values() {
        let store = SettingsStore::in_memory();
        let profile = Profile { id: 1, username: "an".to_string() };
        store.set(USER_KEY, &profile).unwrap();
        assert_eq!(store.get_as::<Profile>(USER_KEY).unwrap(), Some(profile));
        assert_eq!(store.get_as::<Profile>("missing").unwrap(), None);
        assert!(store.get_as::<Profile>(USER_KEY).is_ok());

        store.set("count", 3).unwrap();
        assert!(store.get_as::<Profile>("count").is_err());
        assert!(store.get_string("count").is_none());
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = SettingsStore::open(&path).unwrap();
        store.set_token("tok-1").unwrap();
        drop(store);

        let reopened = SettingsStore::open(&path).unwrap();
        assert_eq!(reopened.token().as_deref(), Some("tok-1"));
        assert_eq!(reopened.path(), Some(path.as_path()));

        reopened.clear().unwrap();
        let again = SettingsStore::open(&path).unwrap();
        assert!(again.token().is_none());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_failed_write_keeps_previous_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = SettingsStore::open(&path).unwrap();
        store.set_token("tok-1").unwrap();

        // A directory where the temp file goes makes every write fail
        fs::create_dir(path.with_extension("tmp")).unwrap();

        assert!(store.set_token("tok-2").is_err());
        assert_eq!(store.token().as_deref(), Some("tok-1"));
        assert!(store.clear_token().is_err());
        assert_eq!(store.token().as_deref(), Some("tok-1"));
        assert!(store.clear().is_err());
        assert_eq!(store.token().as_deref(), Some("tok-1"));

        // Nothing to remove, nothing to write
        store.remove("missing").unwrap();

        let reopened = SettingsStore::open(&path).unwrap();
        assert_eq!(reopened.token().as_deref(), Some("tok-1"));
    }
}
