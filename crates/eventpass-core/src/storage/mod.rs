//! Persistent key/value storage.
//!
//! The cache layer sits on top of a `KeyValueStore`, a small async string
//! store shared by the whole process. Two backends are provided:
//! - `MemoryStore`: an in-process map, handy for tests and throwaway sessions
//! - `FileStore`: a JSON map persisted to a single file on disk

pub mod file;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Async string key/value store.
///
/// Keys are opaque. Nothing here enforces namespacing; any writer using a
/// colliding key overwrites what is there.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set_item(&self, key: &str, value: String) -> Result<(), StorageError>;

    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Remove several keys at once. Missing keys are ignored.
    async fn multi_remove(&self, keys: &[String]) -> Result<(), StorageError>;

    async fn get_all_keys(&self) -> Result<Vec<String>, StorageError>;
}
