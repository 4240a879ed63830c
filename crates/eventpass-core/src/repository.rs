//! Cached access to the event backend.
//!
//! Reads go through `CacheLayer::fetch_cached` with the key for the
//! resource; writes go straight to the source and then drop whatever cached
//! data they made stale.

use std::sync::Arc;

use tracing::info;

use crate::api::{EventSource, RemoteError};
use crate::cache::{CacheKey, CacheLayer, FetchError, Fetched};
use crate::models::{AttendanceRecord, Event, EventDraft, Feedback, UserProfile};

pub type FetchResult<T> = Result<Fetched<T>, FetchError<RemoteError>>;

#[derive(Clone)]
pub struct EventRepository {
    source: Arc<dyn EventSource>,
    cache: CacheLayer,
}

impl EventRepository {
    pub fn new(source: Arc<dyn EventSource>, cache: CacheLayer) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    // ===== Reads =====

    pub async fn all_events(&self) -> FetchResult<Vec<Event>> {
        self.cache
            .fetch_cached(&CacheKey::AllEvents, || self.source.all_events())
            .await
    }

    pub async fn organizer_events(&self, organizer_id: &str) -> FetchResult<Vec<Event>> {
        let key = CacheKey::OrganizerEvents(organizer_id.to_string());
        self.cache
            .fetch_cached(&key, || self.source.organizer_events(organizer_id))
            .await
    }

    pub async fn student_events(&self, student_id: &str) -> FetchResult<Vec<Event>> {
        let key = CacheKey::StudentEvents(student_id.to_string());
        self.cache
            .fetch_cached(&key, || self.source.student_events(student_id))
            .await
    }

    pub async fn event(&self, event_id: &str) -> FetchResult<Event> {
        let key = CacheKey::EventDetail(event_id.to_string());
        self.cache
            .fetch_cached(&key, || self.source.event(event_id))
            .await
    }

    pub async fn attendance(&self, event_id: &str) -> FetchResult<Vec<AttendanceRecord>> {
        let key = CacheKey::EventAttendance(event_id.to_string());
        self.cache
            .fetch_cached(&key, || self.source.event_attendance(event_id))
            .await
    }

    pub async fn profile(&self, user_id: &str) -> FetchResult<UserProfile> {
        let key = CacheKey::UserProfile(user_id.to_string());
        self.cache
            .fetch_cached(&key, || self.source.user_profile(user_id))
            .await
    }

    // ===== Writes =====

    pub async fn mark_attendance(
        &self,
        record: &AttendanceRecord,
    ) -> Result<AttendanceRecord, RemoteError> {
        let saved = self.source.mark_attendance(record).await?;
        self.cache
            .remove(&CacheKey::EventAttendance(record.event_id.clone()))
            .await;
        info!(event_id = %saved.event_id, student_id = %saved.student_id, "Attendance marked");
        Ok(saved)
    }

    pub async fn submit_feedback(&self, feedback: &Feedback) -> Result<(), RemoteError> {
        if !feedback.has_valid_rating() {
            return Err(RemoteError::Rejected(format!(
                "Rating must be between {} and {}, got {}",
                Feedback::MIN_RATING,
                Feedback::MAX_RATING,
                feedback.rating
            )));
        }
        self.source.submit_feedback(feedback).await
    }

    pub async fn create_event(&self, draft: &EventDraft) -> Result<Event, RemoteError> {
        let event = self.source.create_event(draft).await?;
        self.cache.invalidate_event_caches(Some(&event.id)).await;
        info!(event_id = %event.id, "Event created");
        Ok(event)
    }

    pub async fn update_event(&self, event_id: &str, draft: &EventDraft) -> Result<Event, RemoteError> {
        let event = self.source.update_event(event_id, draft).await?;
        self.cache.invalidate_event_caches(Some(event_id)).await;
        Ok(event)
    }

    pub async fn delete_event(&self, event_id: &str) -> Result<(), RemoteError> {
        self.source.delete_event(event_id).await?;
        self.cache.invalidate_event_caches(Some(event_id)).await;
        info!(event_id = %event_id, "Event deleted");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;

    pub const START: i64 = 1_700_000_000_000;

    /// In-memory backend that can be switched offline.
    #[derive(Default)]
    pub struct FakeSource {
        pub events: Mutex<Vec<Event>>,
        pub attendance: Mutex<Vec<AttendanceRecord>>,
        pub feedback: Mutex<Vec<Feedback>>,
        pub offline: AtomicBool,
        pub calls: AtomicUsize,
    }

    impl FakeSource {
        pub fn with_events(events: Vec<Event>) -> Self {
            Self {
                events: Mutex::new(events),
                ..Default::default()
            }
        }

        fn check(&self) -> Result<(), RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                Err(RemoteError::NetworkUnavailable("Network request failed".into()))
            } else {
                Ok(())
            }
        }

        fn find(&self, event_id: &str) -> Result<Event, RemoteError> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.id == event_id)
                .cloned()
                .ok_or_else(|| RemoteError::NotFound(event_id.to_string()))
        }
    }

    pub fn event(id: &str, organizer: &str) -> Event {
        Event {
            id: id.to_string(),
            title: format!("Event {}", id),
            description: None,
            location: None,
            category: None,
            start_date: None,
            end_date: None,
            organizer_id: organizer.to_string(),
            capacity: None,
            image_url: None,
            registered_students: Vec::new(),
        }
    }

    fn draft(title: &str, organizer: &str) -> EventDraft {
        EventDraft {
            title: title.to_string(),
            description: None,
            location: None,
            category: None,
            start_date: None,
            end_date: None,
            organizer_id: organizer.to_string(),
            capacity: Some(30),
        }
    }

    #[async_trait]
    impl EventSource for FakeSource {
        async fn all_events(&self) -> Result<Vec<Event>, RemoteError> {
            self.check()?;
            Ok(self.events.lock().unwrap().clone())
        }

        async fn organizer_events(&self, organizer_id: &str) -> Result<Vec<Event>, RemoteError> {
            self.check()?;
            Ok(self
                .events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.organizer_id == organizer_id)
                .cloned()
                .collect())
        }

        async fn student_events(&self, student_id: &str) -> Result<Vec<Event>, RemoteError> {
            self.check()?;
            Ok(self
                .events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.is_registered(student_id))
                .cloned()
                .collect())
        }

        async fn event(&self, event_id: &str) -> Result<Event, RemoteError> {
            self.check()?;
            self.find(event_id)
        }

        async fn event_attendance(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, RemoteError> {
            self.check()?;
            Ok(self
                .attendance
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.event_id == event_id)
                .cloned()
                .collect())
        }

        async fn user_profile(&self, user_id: &str) -> Result<UserProfile, RemoteError> {
            self.check()?;
            Err(RemoteError::PermissionDenied(format!("cannot read {}", user_id)))
        }

        async fn mark_attendance(&self, record: &AttendanceRecord) -> Result<AttendanceRecord, RemoteError> {
            self.check()?;
            self.find(&record.event_id)?;
            self.attendance.lock().unwrap().push(record.clone());
            Ok(record.clone())
        }

        async fn submit_feedback(&self, feedback: &Feedback) -> Result<(), RemoteError> {
            self.check()?;
            self.feedback.lock().unwrap().push(feedback.clone());
            Ok(())
        }

        async fn create_event(&self, draft: &EventDraft) -> Result<Event, RemoteError> {
            self.check()?;
            let mut events = self.events.lock().unwrap();
            let mut created = event(&format!("new{}", events.len()), &draft.organizer_id);
            created.title = draft.title.clone();
            events.push(created.clone());
            Ok(created)
        }

        async fn update_event(&self, event_id: &str, draft: &EventDraft) -> Result<Event, RemoteError> {
            self.check()?;
            let mut events = self.events.lock().unwrap();
            let existing = events
                .iter_mut()
                .find(|e| e.id == event_id)
                .ok_or_else(|| RemoteError::NotFound(event_id.to_string()))?;
            existing.title = draft.title.clone();
            Ok(existing.clone())
        }

        async fn delete_event(&self, event_id: &str) -> Result<(), RemoteError> {
            self.check()?;
            self.events.lock().unwrap().retain(|e| e.id != event_id);
            Ok(())
        }
    }

    pub fn setup(source: FakeSource) -> (EventRepository, Arc<FakeSource>, Arc<MemoryStore>, Arc<ManualClock>) {
        let source = Arc::new(source);
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(START));
        let cache = CacheLayer::with_clock(store.clone(), clock.clone());
        (EventRepository::new(source.clone(), cache), source, store, clock)
    }

    #[tokio::test]
    async fn test_events_served_from_cache_when_offline() {
        let (repo, source, _, _) = setup(FakeSource::with_events(vec![event("e1", "o1")]));

        let online = repo.all_events().await.unwrap();
        assert!(!online.from_cache);
        assert_eq!(online.data.len(), 1);

        source.offline.store(true, Ordering::SeqCst);
        let offline = repo.all_events().await.unwrap();
        assert!(offline.from_cache);
        assert_eq!(offline.data, online.data);
    }

    #[tokio::test]
    async fn test_offline_without_cache() {
        let (repo, source, _, _) = setup(FakeSource::default());
        source.offline.store(true, Ordering::SeqCst);

        let err = repo.organizer_events("o1").await.unwrap_err();
        assert!(err.is_offline());
    }

    #[tokio::test]
    async fn test_network_first_even_with_fresh_cache() {
        let (repo, source, _, _) = setup(FakeSource::with_events(vec![event("e1", "o1")]));

        repo.event("e1").await.unwrap();
        repo.event("e1").await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_not_found_propagates() {
        let (repo, _, _, _) = setup(FakeSource::default());
        let err = repo.event("missing").await.unwrap_err();
        assert_eq!(err, FetchError::Remote(RemoteError::NotFound("missing".into())));
    }

    #[tokio::test]
    async fn test_profile_denial_is_not_masked() {
        let (repo, _, _, _) = setup(FakeSource::default());
        let key = CacheKey::UserProfile("u1".into());
        let cached = UserProfile {
            id: "u1".into(),
            name: "Ada".into(),
            email: None,
            role: crate::models::Role::Student,
            department: None,
            photo_url: None,
        };
        repo.cache().put(&key, &cached).await;

        let err = repo.profile("u1").await.unwrap_err();
        assert!(matches!(err, FetchError::Remote(RemoteError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_mark_attendance_drops_attendance_cache() {
        let (repo, _, store, _) = setup(FakeSource::with_events(vec![event("e1", "o1")]));
        assert!(repo.attendance("e1").await.unwrap().data.is_empty());
        let key = CacheKey::EventAttendance("e1".into()).storage_key();
        assert!(store.contains_key(&key).await);

        let record = AttendanceRecord {
            event_id: "e1".into(),
            student_id: "s1".into(),
            marked_at: START,
            marked_by: Some("o1".into()),
        };
        repo.mark_attendance(&record).await.unwrap();
        assert!(!store.contains_key(&key).await);

        assert_eq!(repo.attendance("e1").await.unwrap().data, vec![record]);
    }

    #[tokio::test]
    async fn test_event_mutations_invalidate_lists() {
        let (repo, _, store, _) = setup(FakeSource::with_events(vec![event("e1", "o1")]));
        repo.all_events().await.unwrap();
        repo.organizer_events("o1").await.unwrap();
        repo.event("e1").await.unwrap();
        assert_eq!(store.len().await, 3);

        let updated = repo.update_event("e1", &draft("Renamed", "o1")).await.unwrap();
        assert_eq!(updated.title, "Renamed");
        assert!(store.is_empty().await);

        repo.all_events().await.unwrap();
        let created = repo.create_event(&draft("Fresh", "o1")).await.unwrap();
        assert!(store.is_empty().await);

        repo.organizer_events("o1").await.unwrap();
        repo.delete_event(&created.id).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_cache() {
        let (repo, source, store, _) = setup(FakeSource::with_events(vec![event("e1", "o1")]));
        repo.all_events().await.unwrap();

        source.offline.store(true, Ordering::SeqCst);
        assert!(repo.delete_event("e1").await.is_err());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_feedback_rating_checked() {
        let (repo, source, _, _) = setup(FakeSource::default());
        let mut fb = Feedback {
            event_id: "e1".into(),
            student_id: "s1".into(),
            rating: 9,
            comment: None,
        };
        assert!(matches!(
            repo.submit_feedback(&fb).await,
            Err(RemoteError::Rejected(_))
        ));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        fb.rating = 4;
        repo.submit_feedback(&fb).await.unwrap();
        assert_eq!(source.feedback.lock().unwrap().len(), 1);
    }
}
