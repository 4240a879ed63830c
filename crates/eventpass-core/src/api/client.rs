//! HTTP client for the campus event backend.
//!
//! Resources are plain JSON documents under a configurable base URL:
//! `/events`, `/events/{id}`, `/events/{id}/attendance`,
//! `/events/{id}/feedback`, `/students/{id}/events`, `/users/{id}`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{AttendanceRecord, Event, EventDraft, Feedback, UserProfile};

use super::{EventSource, RemoteError};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the event backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid API base URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL cannot hold paths: {}", base_url);
        }

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    fn url(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidResponse(format!("Bad base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match self.token {
            Some(ref token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request, retrying with exponential backoff while rate limited.
    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response, RemoteError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut builder = self.request(method.clone(), url.clone());
            if let Some(body) = body {
                builder = builder.json(body);
            }
            let response = builder.send().await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }
            if status.as_u16() == 429 {
                retries += 1;
                if retries > MAX_RATE_LIMIT_RETRIES {
                    return Err(RemoteError::RateLimited);
                }
                warn!(url = %url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2; // Exponential backoff
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            debug!(url = %url, status = %status, "Request failed");
            return Err(RemoteError::from_status(status, &body));
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, RemoteError> {
        let response = self.send::<()>(Method::GET, url, None).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<T, RemoteError> {
        let response = self.send(method, url, Some(body)).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl EventSource for ApiClient {
    async fn all_events(&self) -> Result<Vec<Event>, RemoteError> {
        self.get(self.url(&["events"])?).await
    }

    async fn organizer_events(&self, organizer_id: &str) -> Result<Vec<Event>, RemoteError> {
        let mut url = self.url(&["events"])?;
        url.query_pairs_mut().append_pair("organizerId", organizer_id);
        self.get(url).await
    }

    async fn student_events(&self, student_id: &str) -> Result<Vec<Event>, RemoteError> {
        self.get(self.url(&["students", student_id, "events"])?).await
    }

    async fn event(&self, event_id: &str) -> Result<Event, RemoteError> {
        self.get(self.url(&["events", event_id])?).await
    }

    async fn event_attendance(&self, event_id: &str) -> Result<Vec<AttendanceRecord>, RemoteError> {
        self.get(self.url(&["events", event_id, "attendance"])?).await
    }

    async fn user_profile(&self, user_id: &str) -> Result<UserProfile, RemoteError> {
        self.get(self.url(&["users", user_id])?).await
    }

    async fn mark_attendance(&self, record: &AttendanceRecord) -> Result<AttendanceRecord, RemoteError> {
        let url = self.url(&["events", record.event_id.as_str(), "attendance"])?;
        self.send_json(Method::POST, url, record).await
    }

    async fn submit_feedback(&self, feedback: &Feedback) -> Result<(), RemoteError> {
        let url = self.url(&["events", feedback.event_id.as_str(), "feedback"])?;
        self.send(Method::POST, url, Some(feedback)).await?;
        Ok(())
    }

    async fn create_event(&self, draft: &EventDraft) -> Result<Event, RemoteError> {
        let url = self.url(&["events"])?;
        self.send_json(Method::POST, url, draft).await
    }

    async fn update_event(&self, event_id: &str, draft: &EventDraft) -> Result<Event, RemoteError> {
        let url = self.url(&["events", event_id])?;
        self.send_json(Method::PUT, url, draft).await
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), RemoteError> {
        let url = self.url(&["events", event_id])?;
        self.send::<()>(Method::DELETE, url, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::NetworkClass;

    #[test]
    fn test_url_building() {
        let client = ApiClient::new("https://api.campus.test/v1/").unwrap();
        assert_eq!(
            client.url(&["events", "evt 1", "attendance"]).unwrap().as_str(),
            "https://api.campus.test/v1/events/evt%201/attendance"
        );

        let bare = ApiClient::new("https://api.campus.test").unwrap();
        assert_eq!(
            bare.url(&["users", "u1"]).unwrap().as_str(),
            "https://api.campus.test/users/u1"
        );
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(ApiClient::new("not a url").is_err());
        assert!(ApiClient::new("mailto:someone@campus.test").is_err());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 1 on loopback is not listening; the connect fails immediately.
        let client = ApiClient::new("http://127.0.0.1:1/").unwrap();
        let err = client.all_events().await.unwrap_err();
        assert!(err.is_network(), "expected network error, got {err:?}");
    }
}
