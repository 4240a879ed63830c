use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::utils::format_age;

/// Envelope persisted for every cached value.
///
/// Stored as `{"data": ..., "timestamp": ..., "expiry": ...}` where
/// `timestamp` is the write time and `expiry` the TTL, both in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    pub timestamp: i64,
    pub expiry: i64,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, now: i64, expiry: Duration) -> Self {
        Self {
            data,
            timestamp: now,
            expiry: expiry.num_milliseconds(),
        }
    }

    pub fn expires_at(&self) -> i64 {
        self.timestamp.saturating_add(self.expiry)
    }

    /// An entry is usable up to and including `timestamp + expiry`.
    pub fn is_valid_at(&self, now: i64) -> bool {
        now <= self.expires_at()
    }

    /// Saturates rather than overflowing on hand-edited timestamps.
    pub fn age_millis(&self, now: i64) -> i64 {
        now.saturating_sub(self.timestamp)
    }

    pub fn age_display(&self, now: i64) -> String {
        format_age(self.age_millis(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_is_inclusive() {
        let entry = CacheEntry::new(vec![1, 2, 3], 1_000, Duration::milliseconds(500));
        assert_eq!(entry.expires_at(), 1_500);
        assert!(entry.is_valid_at(1_000));
        assert!(entry.is_valid_at(1_500));
        assert!(!entry.is_valid_at(1_501));
    }

    #[test]
    fn test_envelope_shape() {
        let entry = CacheEntry::new("hi", 10, Duration::seconds(1));
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"data": "hi", "timestamp": 10, "expiry": 1000})
        );
    }

    #[test]
    fn test_age_display() {
        let entry = CacheEntry::new((), 0, Duration::minutes(5));
        assert_eq!(entry.age_display(30_000), "just now");
        assert_eq!(entry.age_display(3 * 60_000), "3m ago");
    }
}
