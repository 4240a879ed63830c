//! Local caching for offline data access.
//!
//! `CacheLayer` stores JSON envelopes (`data`, `timestamp`, `expiry`) in a
//! shared `KeyValueStore` under the `cache:` namespace. Each resource class
//! has a fixed TTL:
//! - event lists (all / organizer / student): 5 minutes
//! - single event detail: 10 minutes
//! - user profile: 30 minutes
//! - per-event attendance: 2 minutes
//!
//! Fetches go to the network first; the cached copy is only served when the
//! fetch fails for connectivity reasons.

pub mod entry;
pub mod fetch;
pub mod key;
pub mod manager;

pub use entry::CacheEntry;
pub use fetch::{fetch_with_cache, FetchError, Fetched};
pub use key::{CacheKey, KeyScope, ResourceClass, NAMESPACE};
pub use manager::{CacheEntryInfo, CacheLayer};
