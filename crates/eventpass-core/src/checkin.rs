//! Organizer-side attendance check-in.
//!
//! The organizer's scanner hands over the raw QR payload. It is only turned
//! into an attendance record after it parses, is fresh, and names the event
//! being scanned for. Replays inside the validity window are not detected
//! here; duplicate handling belongs to the backend.

use thiserror::Error;
use tracing::{debug, warn};

use crate::api::RemoteError;
use crate::clock::Clock;
use crate::models::AttendanceRecord;
use crate::repository::EventRepository;
use crate::token::{AttendanceToken, TokenError};

#[derive(Error, Debug, PartialEq)]
pub enum CheckInError {
    #[error("Not an attendance code: {0}")]
    Malformed(#[from] TokenError),

    #[error("Attendance code expired")]
    Expired { issued_at: i64 },

    #[error("Attendance code is dated in the future")]
    IssuedInFuture { issued_at: i64 },

    #[error("Attendance code is for event {found}, not {expected}")]
    WrongEvent { expected: String, found: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub struct CheckIn<'a> {
    repository: &'a EventRepository,
    organizer_id: String,
}

impl<'a> CheckIn<'a> {
    pub fn new(repository: &'a EventRepository, organizer_id: impl Into<String>) -> Self {
        Self {
            repository,
            organizer_id: organizer_id.into(),
        }
    }

    /// Check a scanned payload without recording anything.
    pub fn verify(&self, payload: &str, expected_event_id: &str) -> Result<AttendanceToken, CheckInError> {
        let token: AttendanceToken = payload.parse()?;
        let now = self.repository.cache().clock().now_millis();

        if !token.is_fresh_at(now) {
            return Err(if token.age_millis(now) < 0 {
                CheckInError::IssuedInFuture {
                    issued_at: token.issued_at,
                }
            } else {
                CheckInError::Expired {
                    issued_at: token.issued_at,
                }
            });
        }

        if token.event_id != expected_event_id {
            return Err(CheckInError::WrongEvent {
                expected: expected_event_id.to_string(),
                found: token.event_id,
            });
        }

        Ok(token)
    }

    /// Verify a scanned payload and mark the student present.
    pub async fn scan(&self, payload: &str, expected_event_id: &str) -> Result<AttendanceRecord, CheckInError> {
        let token = match self.verify(payload, expected_event_id) {
            Ok(token) => token,
            Err(e) => {
                debug!(error = %e, "Rejected scanned code");
                return Err(e);
            }
        };

        let record = AttendanceRecord {
            event_id: token.event_id,
            student_id: token.student_id,
            marked_at: self.repository.cache().clock().now_millis(),
            marked_by: Some(self.organizer_id.clone()),
        };

        self.repository.mark_attendance(&record).await.map_err(|e| {
            warn!(event_id = %record.event_id, error = %e, "Failed to mark attendance");
            CheckInError::from(e)
        })
    }
}
