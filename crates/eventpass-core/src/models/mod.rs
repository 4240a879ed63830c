//! Data models for campus event entities.
//!
//! - `Event`, `EventDraft`: events as stored by the backend and as edited
//! - `UserProfile`, `Role`: organizers and students
//! - `AttendanceRecord`: the persisted effect of a scanned token
//! - `Feedback`: post-event ratings

pub mod attendance;
pub mod event;
pub mod user;

pub use attendance::{AttendanceRecord, Feedback};
pub use event::{Event, EventDraft};
pub use user::{Role, UserProfile};
