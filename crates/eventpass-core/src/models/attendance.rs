use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttendanceRecord {
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(rename = "studentId")]
    pub student_id: String,
    /// When attendance was marked, ms since epoch.
    #[serde(rename = "markedAt")]
    pub marked_at: i64,
    #[serde(rename = "markedBy", default)]
    pub marked_by: Option<String>,
}

/// Post-event feedback from a student.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Feedback {
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(rename = "studentId")]
    pub student_id: String,
    pub rating: u8,
    pub comment: Option<String>,
}

impl Feedback {
    pub const MIN_RATING: u8 = 1;
    pub const MAX_RATING: u8 = 5;

    pub fn has_valid_rating(&self) -> bool {
        (Self::MIN_RATING..=Self::MAX_RATING).contains(&self.rating)
    }
}
