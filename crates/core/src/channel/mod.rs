//! Streaming channel integration (Tunarr).
//!
//! Acquired movies are programmed onto a continuously running channel.

mod tunarr;
mod types;

pub use tunarr::{TunarrClient, TunarrConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Trait for channel service clients, the seam the orchestrator talks to.
#[async_trait]
pub trait ChannelService: Send + Sync {
    /// All channels on the server.
    async fn list_channels(&self) -> Result<Vec<Channel>, ChannelError>;

    /// Create a channel under a guide group (or reuse one of the same name).
    async fn create_channel(&self, name: &str, group: &str) -> Result<Channel, ChannelError>;

    /// Titles currently programmed on a channel.
    async fn list_program_titles(&self, channel_id: &str) -> Result<Vec<String>, ChannelError>;

    /// Append one movie to a channel's lineup.
    async fn append_program(
        &self,
        channel: &Channel,
        entry: &ProgramEntry,
    ) -> Result<(), ChannelError>;

    /// Renumber all channels sequentially from 1.
    async fn normalize_channel_numbers(&self) -> Result<u32, ChannelError>;
}

/// Errors that can occur when interacting with the channel service.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured.
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}
