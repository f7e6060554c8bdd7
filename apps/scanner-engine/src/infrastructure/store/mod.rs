//! Preference Store Adapters
//!
//! Durable key -> ordered-list-of-strings storage behind the
//! [`PreferenceStore`] port. The file-backed adapter serves production;
//! the in-memory adapter serves tests and the degraded mode entered when
//! storage is unavailable.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::ports::{PreferenceStore, StoreError};

// =============================================================================
// File-Backed Store
// =============================================================================

/// JSON-file-backed preference store.
///
/// The whole store is one JSON object (`key -> [values]`); writes are
/// read-modify-write under an internal lock. Suited to small,
/// human-triggered preference writes, not pipelined data.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Create a store backed by the given file. The file and its parent
    /// directory are created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_map(&self) -> Result<HashMap<String, Vec<String>>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt(e.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }
}

#[async_trait]
impl PreferenceStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<String>>, StoreError> {
        let mut map = self.read_map().await?;
        Ok(map.remove(key))
    }

    async fn set(&self, key: &str, values: &[String]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.read_map().await?;
        map.insert(key.to_string(), values.to_vec());

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let bytes =
            serde_json::to_vec_pretty(&map).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// In-memory implementation of [`PreferenceStore`].
///
/// Suitable for tests and for running without durable storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: parking_lot::RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<String>>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, values: &[String]) -> Result<(), StoreError> {
        self.entries
            .write()
            .insert(key.to_string(), values.to_vec());
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn list(ids: &[&str]) -> Vec<String> {
        ids.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn file_store_round_trips_a_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("prefs.json"));

        store.set("pins", &list(&["sc", "dt"])).await.unwrap();

        let value = store.get("pins").await.unwrap();
        assert_eq!(value, Some(list(&["sc", "dt"])));
    }

    #[tokio::test]
    async fn file_store_missing_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("prefs.json"));

        assert_eq!(store.get("pins").await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_overwrite_replaces_the_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("prefs.json"));

        store.set("pins", &list(&["sc"])).await.unwrap();
        store.set("pins", &list(&["dt", "ai"])).await.unwrap();

        assert_eq!(store.get("pins").await.unwrap(), Some(list(&["dt", "ai"])));
    }

    #[tokio::test]
    async fn file_store_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("prefs.json"));

        store.set("pins", &list(&["sc"])).await.unwrap();
        store.set("layout", &list(&["grid"])).await.unwrap();

        assert_eq!(store.get("pins").await.unwrap(), Some(list(&["sc"])));
        assert_eq!(store.get("layout").await.unwrap(), Some(list(&["grid"])));
    }

    #[tokio::test]
    async fn file_store_creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("prefs.json"));

        store.set("pins", &list(&["sc"])).await.unwrap();
        assert_eq!(store.get("pins").await.unwrap(), Some(list(&["sc"])));
    }

    #[tokio::test]
    async fn file_store_corrupt_contents_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let store = JsonFileStore::new(path);
        assert!(matches!(
            store.get("pins").await,
            Err(StoreError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.get("pins").await.unwrap(), None);

        store.set("pins", &list(&["sc", "dt"])).await.unwrap();
        assert_eq!(store.get("pins").await.unwrap(), Some(list(&["sc", "dt"])));
    }
}
