//! Types for debrid service operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur against the debrid service.
#[derive(Debug, Error)]
pub enum DebridError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Transient backend condition; the caller may retry.
    #[error("Service temporarily unavailable: {0}")]
    ServiceUnavailable(String),

    /// The service already holds this content.
    #[error("Content already active on the service")]
    Duplicate,

    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DebridError {
    /// Whether a retry of the same call can plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DebridError::ServiceUnavailable(_)
                | DebridError::Timeout
                | DebridError::ConnectionFailed(_)
        )
    }
}

impl From<reqwest::Error> for DebridError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            DebridError::Timeout
        } else if e.is_connect() {
            DebridError::ConnectionFailed(e.to_string())
        } else {
            DebridError::Internal(e.to_string())
        }
    }
}

/// A torrent currently held by the debrid service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTorrent {
    /// Service-side identifier.
    pub id: String,
    /// Display name on the service.
    pub name: String,
    /// Info hash, lowercase hex.
    pub hash: String,
    /// Service status string (e.g. "downloading", "downloaded").
    pub status: String,
    /// Completion percentage (0.0 - 100.0).
    pub progress: f64,
    /// When it was added, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

/// Debrid account details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub username: String,
    pub premium: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
}

/// Trait for debrid service backends.
#[async_trait]
pub trait DebridClient: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Account details (used for a startup premium check).
    async fn account(&self) -> Result<AccountInfo, DebridError>;

    /// List torrents currently held by the service.
    async fn list_active(&self, limit: u32) -> Result<Vec<ActiveTorrent>, DebridError>;

    /// Submit a magnet URI. Returns the service-side id.
    async fn submit_magnet(&self, uri: &str) -> Result<String, DebridError>;

    /// Start fetching content for an accepted submission.
    async fn begin_fetch(&self, id: &str) -> Result<(), DebridError>;

    /// Remove a torrent from the service.
    async fn remove(&self, id: &str) -> Result<(), DebridError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(DebridError::ServiceUnavailable("503".to_string()).is_transient());
        assert!(DebridError::Timeout.is_transient());
        assert!(DebridError::ConnectionFailed("refused".to_string()).is_transient());

        assert!(!DebridError::Duplicate.is_transient());
        assert!(!DebridError::AuthenticationFailed("bad token".to_string()).is_transient());
        assert!(!DebridError::ApiError {
            status: 400,
            message: "bad magnet".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_active_torrent_serialization() {
        let torrent = ActiveTorrent {
            id: "ABCDEF".to_string(),
            name: "Some.Movie.1080p".to_string(),
            hash: "0123456789abcdef0123456789abcdef01234567".to_string(),
            status: "downloading".to_string(),
            progress: 42.5,
            added_at: None,
        };

        let json = serde_json::to_string(&torrent).unwrap();
        let parsed: ActiveTorrent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, "ABCDEF");
        assert!((parsed.progress - 42.5).abs() < f64::EPSILON);
    }
}
