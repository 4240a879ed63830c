//! Remote data access for the event backend.
//!
//! `EventSource` is the seam between the cache/repository layer and
//! whatever actually holds the data. `ApiClient` implements it over HTTP.
//! All failures come back as `RemoteError`, whose variants tell the cache
//! layer whether a cached fallback is allowed.

pub mod client;
pub mod error;

use async_trait::async_trait;

use crate::models::{AttendanceRecord, Event, EventDraft, Feedback, UserProfile};

pub use client::ApiClient;
pub use error::{is_network_text, NetworkClass, RemoteError};

#[async_trait]
pub trait EventSource: Send + Sync {
    async fn all_events(&self) -> Result<Vec<Event>, RemoteError>;

    async fn organizer_events(&self, organizer_id: &str) -> Result<Vec<Event>, RemoteError>;

    async fn student_events(&self, student_id: &str) -> Result<Vec<Event>, RemoteError>;

    async fn event(&self, event_id: &str) -> Result<Event, RemoteError>;

    async fn event_attendance(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, RemoteError>;

    async fn user_profile(&self, user_id: &str) -> Result<UserProfile, RemoteError>;

    /// Persist an attendance record. Duplicate handling is up to the backend.
    async fn mark_attendance(&self, record: &AttendanceRecord) -> Result<AttendanceRecord, RemoteError>;

    async fn submit_feedback(&self, feedback: &Feedback) -> Result<(), RemoteError>;

    async fn create_event(&self, draft: &EventDraft) -> Result<Event, RemoteError>;

    async fn update_event(&self, event_id: &str, draft: &EventDraft) -> Result<Event, RemoteError>;

    async fn delete_event(&self, event_id: &str) -> Result<(), RemoteError>;
}
