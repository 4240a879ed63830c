use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use serde::{de::DeserializeOwned, de::IgnoredAny, Serialize};
use tracing::{debug, info, warn};

use crate::api::NetworkClass;
use crate::clock::{Clock, SystemClock};
use crate::storage::{KeyValueStore, StorageError};

use super::entry::CacheEntry;
use super::fetch::{fetch_with_cache, FetchError, Fetched};
use super::key::{CacheKey, KeyScope};

/// Read-through cache over a shared key/value store.
///
/// Every failure inside the cache (store I/O, bad JSON, wrong shape) is
/// logged and turned into a miss or a no-op. Callers never see a cache error.
/// Clone is cheap; clones share the same store and clock.
#[derive(Clone)]
pub struct CacheLayer {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

/// Diagnostic view of one stored entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntryInfo {
    pub storage_key: String,
    pub key: Option<CacheKey>,
    pub age_ms: i64,
    pub fresh: bool,
}

impl CacheLayer {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    async fn load<T: DeserializeOwned>(
        &self,
        storage_key: &str,
    ) -> Result<Option<CacheEntry<T>>, StorageError> {
        match self.store.get_item(storage_key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Cached value for `key`, or `None` when absent, expired or unreadable.
    /// Expired entries are deleted on the way out.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let storage_key = key.storage_key();
        let entry = match self.load::<T>(&storage_key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %storage_key, error = %e, "Failed to read cache entry");
                return None;
            }
        };

        if !entry.is_valid_at(self.clock.now_millis()) {
            debug!(key = %storage_key, "Cache entry expired");
            if let Err(e) = self.store.remove_item(&storage_key).await {
                warn!(key = %storage_key, error = %e, "Failed to drop expired cache entry");
            }
            return None;
        }

        Some(entry.data)
    }

    /// Store `data` under `key` for `expiry`, replacing whatever was there.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &CacheKey, data: &T, expiry: Duration) {
        let storage_key = key.storage_key();
        let entry = CacheEntry::new(data, self.clock.now_millis(), expiry);
        let result = match serde_json::to_string(&entry) {
            Ok(json) => self.store.set_item(&storage_key, json).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!(key = %storage_key, error = %e, "Failed to write cache entry");
        }
    }

    /// `set` with the TTL of the key's resource class.
    pub async fn put<T: Serialize + ?Sized>(&self, key: &CacheKey, data: &T) {
        self.set(key, data, key.ttl()).await
    }

    pub async fn remove(&self, key: &CacheKey) {
        let storage_key = key.storage_key();
        if let Err(e) = self.store.remove_item(&storage_key).await {
            warn!(key = %storage_key, error = %e, "Failed to remove cache entry");
        }
    }

    /// Storage keys in `scope`. Enumeration failures yield an empty list.
    async fn keys_in(&self, scope: KeyScope) -> Vec<String> {
        match self.store.get_all_keys().await {
            Ok(keys) => keys.into_iter().filter(|k| scope.contains(k)).collect(),
            Err(e) => {
                warn!(scope = ?scope, error = %e, "Failed to enumerate cache keys");
                Vec::new()
            }
        }
    }

    async fn remove_many(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }
        if let Err(e) = self.store.multi_remove(keys).await {
            warn!(count = keys.len(), error = %e, "Failed to remove cache entries");
        }
    }

    /// Drop every cache entry. Keys outside the cache namespace are kept.
    pub async fn clear_all(&self) {
        let keys = self.keys_in(KeyScope::Namespace).await;
        self.remove_many(&keys).await;
        info!(count = keys.len(), "Cleared cache");
    }

    /// Drop cached event data after an event was created, edited or deleted.
    ///
    /// Always drops the all-events list and every per-organizer and
    /// per-student list. With `event_id`, also drops that event's detail and
    /// attendance entries.
    pub async fn invalidate_event_caches(&self, event_id: Option<&str>) {
        let mut keys = vec![CacheKey::AllEvents.storage_key()];
        if let Some(id) = event_id {
            keys.push(CacheKey::EventDetail(id.to_string()).storage_key());
            keys.push(CacheKey::EventAttendance(id.to_string()).storage_key());
        }
        keys.extend(self.keys_in(KeyScope::OrganizerEvents).await);
        keys.extend(self.keys_in(KeyScope::StudentEvents).await);

        debug!(event_id = ?event_id, count = keys.len(), "Invalidating event caches");
        self.remove_many(&keys).await;
    }

    pub async fn invalidate_user_cache(&self, user_id: &str) {
        self.remove(&CacheKey::UserProfile(user_id.to_string())).await
    }

    /// Fetch through `fetch`, caching under `key` with its class TTL and
    /// serving the cached copy on network failure.
    pub async fn fetch_cached<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        fetch: F,
    ) -> Result<Fetched<T>, FetchError<E>>
    where
        T: Serialize + DeserializeOwned,
        E: NetworkClass + Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        fetch_with_cache(
            fetch,
            |data: &T| {
                let value = serde_json::to_value(data);
                async move {
                    match value {
                        Ok(value) => self.put(key, &value).await,
                        Err(e) => warn!(key = %key, error = %e, "Failed to serialize fetched data"),
                    }
                }
            },
            || self.get::<T>(key),
        )
        .await
    }

    /// Every entry in the cache namespace with its age and freshness.
    pub async fn entries(&self) -> Vec<CacheEntryInfo> {
        let now = self.clock.now_millis();
        let mut infos = Vec::new();
        for storage_key in self.keys_in(KeyScope::Namespace).await {
            match self.load::<IgnoredAny>(&storage_key).await {
                Ok(Some(entry)) => infos.push(CacheEntryInfo {
                    key: CacheKey::from_storage_key(&storage_key),
                    age_ms: entry.age_millis(now),
                    fresh: entry.is_valid_at(now),
                    storage_key,
                }),
                Ok(None) => {}
                Err(e) => {
                    debug!(key = %storage_key, error = %e, "Skipping unreadable cache entry");
                }
            }
        }
        infos
    }
}

// ============================================================================
// Tests
// ============================================================================
