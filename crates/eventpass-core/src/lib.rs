//! EventPass core library.
//!
//! This crate holds the logic behind the campus event client that is not UI:
//!
//! - `token`: attendance QR tokens (`eventId:studentId:issuedAt`)
//! - `cache`: TTL cache over a key/value store with network-first fetches
//! - `storage`: the key/value store abstraction plus memory and file backends
//! - `api`: HTTP client for the event backend and its error taxonomy
//! - `repository`: cached access to events, profiles and attendance
//! - `checkin`: organizer-side scan-to-mark-attendance flow
//! - `models`: event, profile, attendance and feedback records
//! - `config`: persisted client configuration

pub mod api;
pub mod cache;
pub mod checkin;
pub mod clock;
pub mod config;
pub mod models;
pub mod repository;
pub mod storage;
pub mod token;
pub mod utils;

pub use api::{ApiClient, EventSource, NetworkClass, RemoteError};
pub use cache::{CacheKey, CacheLayer, FetchError, Fetched, KeyScope};
pub use checkin::{CheckIn, CheckInError};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use repository::EventRepository;
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use token::{AttendanceToken, TokenError};
