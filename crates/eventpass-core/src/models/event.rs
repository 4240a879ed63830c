use chrono::DateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(rename = "organizerId")]
    pub organizer_id: String,
    pub capacity: Option<u32>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    #[serde(rename = "registeredStudents", default)]
    pub registered_students: Vec<String>,
}

impl Event {
    pub fn is_registered(&self, student_id: &str) -> bool {
        self.registered_students.iter().any(|s| s == student_id)
    }

    pub fn registered_count(&self) -> usize {
        self.registered_students.len()
    }

    /// Seats left, or `None` when the event has no capacity limit.
    pub fn seats_left(&self) -> Option<u32> {
        self.capacity
            .map(|cap| cap.saturating_sub(self.registered_students.len() as u32))
    }

    pub fn is_full(&self) -> bool {
        self.seats_left() == Some(0)
    }

    pub fn formatted_date(&self) -> String {
        match &self.start_date {
            Some(date) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
                    dt.format("%b %d, %Y").to_string()
                } else {
                    date.chars().take(10).collect()
                }
            }
            None => "TBD".to_string(),
        }
    }

    /// Formatted start datetime: "Feb 06, 2026 @ 07:00 PM"
    pub fn formatted_start_datetime(&self) -> String {
        match &self.start_date {
            Some(date) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
                    dt.format("%b %d, %Y @ %I:%M %p").to_string()
                } else {
                    date.chars().take(16).collect()
                }
            }
            None => "TBD".to_string(),
        }
    }
}

/// Fields an organizer fills in when creating or editing an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    #[serde(rename = "organizerId")]
    pub organizer_id: String,
    pub capacity: Option<u32>,
}
