//! Attendance QR tokens.
//!
//! A token binds a student to an event at a point in time and is rendered
//! as a QR code on the student's screen. The wire form is
//! `eventId:studentId:issuedAtMs` with no escaping, so identifiers must not
//! contain `:`. Tokens are not signed; anyone who can build the string can
//! present it. Validity is purely a function of the local clock.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

use crate::clock::Clock;

/// Separator between token fields.
pub const TOKEN_DELIMITER: char = ':';

/// How long a token stays valid after it is issued (24 hours).
pub const TOKEN_VALIDITY_MS: i64 = 86_400_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Expected 3 token segments, found {0}")]
    SegmentCount(usize),

    #[error("Invalid issue timestamp: {0}")]
    Timestamp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceToken {
    pub event_id: String,
    pub student_id: String,
    /// Issue time in milliseconds since the Unix epoch.
    pub issued_at: i64,
}

impl AttendanceToken {
    pub fn new(event_id: impl Into<String>, student_id: impl Into<String>, issued_at: i64) -> Self {
        Self {
            event_id: event_id.into(),
            student_id: student_id.into(),
            issued_at,
        }
    }

    /// Issue a token for `event_id` and `student_id` stamped with the current time.
    pub fn issue(event_id: &str, student_id: &str, clock: &dyn Clock) -> Self {
        Self::new(event_id, student_id, clock.now_millis())
    }

    /// Render the QR payload.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Milliseconds since issue, saturating at the `i64` bounds.
    /// Negative when issued in the future.
    pub fn age_millis(&self, now: i64) -> i64 {
        now.saturating_sub(self.issued_at)
    }

    /// Fresh means issued no later than `now` and less than 24h ago.
    pub fn is_fresh_at(&self, now: i64) -> bool {
        now.checked_sub(self.issued_at)
            .is_some_and(|age| (0..TOKEN_VALIDITY_MS).contains(&age))
    }

    /// First instant (ms) at which the token is no longer valid.
    pub fn expires_at(&self) -> i64 {
        self.issued_at.saturating_add(TOKEN_VALIDITY_MS)
    }

    /// Time left before expiry, clamped at zero.
    pub fn remaining(&self, now: i64) -> Duration {
        Duration::milliseconds(self.expires_at().saturating_sub(now).max(0))
    }
}

impl fmt::Display for AttendanceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.event_id, TOKEN_DELIMITER, self.student_id, TOKEN_DELIMITER, self.issued_at
        )
    }
}

impl FromStr for AttendanceToken {
    type Err = TokenError;

    /// Surrounding whitespace (scanners often append a newline) is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(TOKEN_DELIMITER).collect();
        let [event_id, student_id, issued_at] = parts.as_slice() else {
            return Err(TokenError::SegmentCount(parts.len()));
        };

        let issued_at = issued_at
            .parse::<i64>()
            .map_err(|_| TokenError::Timestamp(issued_at.to_string()))?;

        Ok(Self::new(*event_id, *student_id, issued_at))
    }
}

/// Produce a token payload for `event_id` and `student_id` issued now.
pub fn generate(event_id: &str, student_id: &str, clock: &dyn Clock) -> String {
    AttendanceToken::issue(event_id, student_id, clock).encode()
}

/// Parse a scanned payload. Anything that is not a well-formed token,
/// including scanner noise and foreign QR codes, yields `None`.
pub fn parse(token: &str) -> Option<AttendanceToken> {
    token.parse().ok()
}

/// Whether `token` parses and was issued within the last 24 hours.
/// Future-dated tokens are rejected.
pub fn is_valid(token: &str, clock: &dyn Clock) -> bool {
    parse(token).is_some_and(|t| t.is_fresh_at(clock.now_millis()))
}
