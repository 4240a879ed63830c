use thiserror::Error;

/// Errors raised by the remote data layer.
///
/// The cache layer decides whether to fall back to cached data by matching
/// on these variants, not by reading messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    Server(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Whether an error was caused by lost connectivity rather than by the
/// backend refusing the request.
pub trait NetworkClass {
    fn is_network(&self) -> bool;
}

impl NetworkClass for RemoteError {
    fn is_network(&self) -> bool {
        matches!(self, RemoteError::NetworkUnavailable(_))
    }
}

/// Substrings that mark a message or code as connectivity-related.
const NETWORK_MARKERS: &[&str] = &["network", "fetch", "connection", "timeout"];

/// Codes that mean "offline" even without one of the markers.
const OFFLINE_CODES: &[&str] = &["unavailable", "auth/network-request-failed"];

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Text heuristic for error shapes that do not come from `ApiClient`.
///
/// Case-insensitive. Matches when either the code or the message contains
/// one of the network markers, or when the code is a known offline code.
pub fn is_network_text(code: Option<&str>, message: &str) -> bool {
    let message = message.to_lowercase();
    let code = code.map(str::to_lowercase).unwrap_or_default();

    let has_marker = |s: &str| NETWORK_MARKERS.iter().any(|m| s.contains(m));
    has_marker(&message) || has_marker(&code) || OFFLINE_CODES.contains(&code.as_str())
}

impl RemoteError {
    /// Map a foreign `(code, message)` pair onto a variant.
    pub fn from_code(code: Option<&str>, message: &str) -> Self {
        if is_network_text(code, message) {
            return RemoteError::NetworkUnavailable(message.to_string());
        }
        let lowered = code.map(str::to_lowercase).unwrap_or_default();
        match lowered.as_str() {
            "permission-denied" | "unauthenticated" => {
                RemoteError::PermissionDenied(message.to_string())
            }
            "not-found" => RemoteError::NotFound(message.to_string()),
            "invalid-argument" | "failed-precondition" | "already-exists" => {
                RemoteError::Rejected(message.to_string())
            }
            "resource-exhausted" => RemoteError::RateLimited,
            _ => RemoteError::Server(message.to_string()),
        }
    }

    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 | 403 => RemoteError::PermissionDenied(truncated),
            404 => RemoteError::NotFound(truncated),
            400 | 409 | 422 => RemoteError::Rejected(truncated),
            429 => RemoteError::RateLimited,
            503 => RemoteError::NetworkUnavailable(format!("unavailable: {}", truncated)),
            500..=599 => RemoteError::Server(truncated),
            _ => RemoteError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() || e.is_request() {
            RemoteError::NetworkUnavailable(e.to_string())
        } else if e.is_decode() {
            RemoteError::InvalidResponse(e.to_string())
        } else if let Some(status) = e.status() {
            RemoteError::from_status(status, &e.to_string())
        } else {
            RemoteError::from_code(None, &e.to_string())
        }
    }
}
