//! Typed cache keys.
//!
//! Every key the cache writes is built here, so the storage-key layout and
//! the prefix scans used for invalidation cannot drift apart.

use std::fmt;

use chrono::Duration;

/// Namespace shared by every cache entry in the store.
pub const NAMESPACE: &str = "cache:";

const ALL_EVENTS: &str = "cache:events:all";
const ORGANIZER_EVENTS_PREFIX: &str = "cache:events:organizer:";
const STUDENT_EVENTS_PREFIX: &str = "cache:events:student:";
const EVENT_DETAIL_PREFIX: &str = "cache:event:";
const USER_PROFILE_PREFIX: &str = "cache:user:";
const ATTENDANCE_PREFIX: &str = "cache:attendance:";

/// Categories of cached data, each with a fixed TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    EventList,
    EventDetail,
    UserProfile,
    Attendance,
}

impl ResourceClass {
    pub fn ttl(&self) -> Duration {
        match self {
            ResourceClass::EventList => Duration::minutes(5),
            ResourceClass::EventDetail => Duration::minutes(10),
            ResourceClass::UserProfile => Duration::minutes(30),
            ResourceClass::Attendance => Duration::minutes(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    AllEvents,
    OrganizerEvents(String),
    StudentEvents(String),
    EventDetail(String),
    UserProfile(String),
    EventAttendance(String),
}

impl CacheKey {
    pub fn resource_class(&self) -> ResourceClass {
        match self {
            CacheKey::AllEvents | CacheKey::OrganizerEvents(_) | CacheKey::StudentEvents(_) => {
                ResourceClass::EventList
            }
            CacheKey::EventDetail(_) => ResourceClass::EventDetail,
            CacheKey::UserProfile(_) => ResourceClass::UserProfile,
            CacheKey::EventAttendance(_) => ResourceClass::Attendance,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.resource_class().ttl()
    }

    /// The string under which this entry lives in the key/value store.
    pub fn storage_key(&self) -> String {
        match self {
            CacheKey::AllEvents => ALL_EVENTS.to_string(),
            CacheKey::OrganizerEvents(id) => format!("{}{}", ORGANIZER_EVENTS_PREFIX, id),
            CacheKey::StudentEvents(id) => format!("{}{}", STUDENT_EVENTS_PREFIX, id),
            CacheKey::EventDetail(id) => format!("{}{}", EVENT_DETAIL_PREFIX, id),
            CacheKey::UserProfile(id) => format!("{}{}", USER_PROFILE_PREFIX, id),
            CacheKey::EventAttendance(id) => format!("{}{}", ATTENDANCE_PREFIX, id),
        }
    }

    /// Recover a key from its storage form. `None` for anything this cache
    /// did not write.
    pub fn from_storage_key(key: &str) -> Option<Self> {
        if key == ALL_EVENTS {
            return Some(CacheKey::AllEvents);
        }
        let prefixed: [(&str, fn(String) -> CacheKey); 5] = [
            (ORGANIZER_EVENTS_PREFIX, CacheKey::OrganizerEvents),
            (STUDENT_EVENTS_PREFIX, CacheKey::StudentEvents),
            (EVENT_DETAIL_PREFIX, CacheKey::EventDetail),
            (USER_PROFILE_PREFIX, CacheKey::UserProfile),
            (ATTENDANCE_PREFIX, CacheKey::EventAttendance),
        ];
        prefixed.into_iter().find_map(|(prefix, build)| {
            key.strip_prefix(prefix)
                .filter(|id| !id.is_empty())
                .map(|id| build(id.to_string()))
        })
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// A group of keys discovered by prefix scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope {
    /// Everything the cache owns.
    Namespace,
    /// Per-organizer event lists.
    OrganizerEvents,
    /// Per-student event lists.
    StudentEvents,
}

impl KeyScope {
    pub fn prefix(&self) -> &'static str {
        match self {
            KeyScope::Namespace => NAMESPACE,
            KeyScope::OrganizerEvents => ORGANIZER_EVENTS_PREFIX,
            KeyScope::StudentEvents => STUDENT_EVENTS_PREFIX,
        }
    }

    pub fn contains(&self, storage_key: &str) -> bool {
        storage_key.starts_with(self.prefix())
    }
}
