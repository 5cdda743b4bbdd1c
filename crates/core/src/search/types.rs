//! Types for the torrent discovery subsystem.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// A release offered by one source, already quality-filtered and carrying
/// a resolved magnet URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Release name as listed by the source.
    pub name: String,
    /// Seeders reported by the source at listing time.
    pub seeders: u32,
    /// Resolved magnet URI. Never empty.
    pub magnet_uri: String,
    /// Which site adapter produced this candidate.
    pub source: &'static str,
}

/// Merged outcome of fanning a query out to every registered site.
#[derive(Debug, Clone, Default)]
pub struct AggregateResult {
    /// All surviving candidates, sorted by seeders descending.
    pub candidates: Vec<SearchCandidate>,
    /// Sites that failed outright (name -> error message). A failed site
    /// contributes nothing but never aborts the aggregate.
    pub source_errors: HashMap<String, String>,
    /// Wall-clock duration of the whole fan-out in milliseconds.
    pub duration_ms: u64,
}

/// Errors produced by a single site adapter.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Unexpected HTTP status: {0}")]
    HttpStatus(u16),

    #[error("Failed to parse site response: {0}")]
    ParseError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for SiteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SiteError::Timeout
        } else if e.is_connect() {
            SiteError::ConnectionFailed(e.to_string())
        } else {
            SiteError::Internal(e.to_string())
        }
    }
}

/// Trait for a single torrent site.
///
/// Implementations own their listing format (HTML scrape or JSON API) and
/// their magnet resolution strategy, and must apply the shared quality
/// policy before returning. Failures are reported, never panicked; the
/// aggregator treats a failed site as an empty contribution.
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// Source name for logging and candidate attribution.
    fn name(&self) -> &'static str;

    /// Run one search against this site. Returns at most a handful of
    /// quality-filtered candidates, each with a resolved magnet URI.
    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, SiteError>;
}
