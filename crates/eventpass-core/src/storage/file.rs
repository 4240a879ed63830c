use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{KeyValueStore, StorageError};

/// Key/value store persisted as a single JSON object on disk.
///
/// The whole map is held in memory and rewritten on every mutation. The
/// file is written to a sibling temp file first and then renamed into place.
pub struct FileStore {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating parent directories as needed.
    /// A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let items = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), entries = items.len(), "Opened file store");

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `items` to disk. The temp file is removed if the write fails.
    async fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        let result = match tokio::fs::write(&tmp, contents).await {
            Ok(()) => tokio::fs::rename(&tmp, &self.path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                debug!(path = %tmp.display(), error = %cleanup, "Could not remove temp file");
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Apply `change` to a copy of the map and keep it only once it is on disk.
    async fn update<F>(&self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let mut items = self.items.lock().await;
        let mut next = items.clone();
        if !change(&mut next) {
            return Ok(());
        }
        self.persist(&next).await?;
        *items = next;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.lock().await.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.update(|items| {
            items.insert(key.to_string(), value);
            true
        })
        .await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.update(|items| items.remove(key).is_some()).await
    }

    async fn multi_remove(&self, keys: &[String]) -> Result<(), StorageError> {
        self.update(|items| {
            let before = items.len();
            for key in keys {
                items.remove(key);
            }
            items.len() != before
        })
        .await
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.items.lock().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = FileStore::open(&path).await.unwrap();
        store.set_item("cache:event:1", "{}".to_string()).await.unwrap();
        store.set_item("settings", "dark".to_string()).await.unwrap();
        drop(store);

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(
            reopened.get_item("settings").await.unwrap().as_deref(),
            Some("dark")
        );
        assert_eq!(reopened.get_all_keys().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_file_store_multi_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::open(&path).await.unwrap();
        store.set_item("a", "1".to_string()).await.unwrap();
        store.set_item("b", "2".to_string()).await.unwrap();
        store.multi_remove(&["a".to_string()]).await.unwrap();

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(reopened.get_all_keys().await.unwrap(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::open(&path).await.unwrap();
        store.set_item("settings", "dark".to_string()).await.unwrap();

        // A directory in the temp file's place makes every write fail.
        std::fs::create_dir(dir.path().join("store.json.tmp")).unwrap();

        assert!(store.set_item("cache:event:e1", "v".to_string()).await.is_err());
        assert_eq!(store.get_item("cache:event:e1").await.unwrap(), None);

        assert!(store.remove_item("settings").await.is_err());
        assert!(store.multi_remove(&["settings".to_string()]).await.is_err());
        assert_eq!(
            store.get_item("settings").await.unwrap().as_deref(),
            Some("dark")
        );
        assert_eq!(store.get_all_keys().await.unwrap(), vec!["settings".to_string()]);

        let reopened = FileStore::open(&path).await.unwrap();
        assert_eq!(reopened.get_all_keys().await.unwrap(), vec!["settings".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::open(&path).await.unwrap();
        // A non-empty directory at the target path makes the rename fail.
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), "x").unwrap();

        assert!(store.set_item("a", "1".to_string()).await.is_err());
        assert!(!dir.path().join("store.json.tmp").exists());
        assert_eq!(store.get_item("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let result = FileStore::open(&path).await;
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }
}
