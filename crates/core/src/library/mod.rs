//! Media library integration (Jellyfin).
//!
//! Used to skip titles already owned, to group acquisitions into a
//! collection, and to clean duplicate entries.

mod jellyfin;
mod types;

pub use jellyfin::{JellyfinClient, JellyfinConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Trait for media library clients, the seam the orchestrator talks to.
#[async_trait]
pub trait LibraryService: Send + Sync {
    /// Find a movie by title, honoring the configured match mode.
    async fn find_item_by_title(&self, title: &str) -> Result<Option<LibraryItem>, LibraryError>;

    /// All movies in the library.
    async fn list_movies(&self) -> Result<Vec<LibraryItem>, LibraryError>;

    /// Create a collection (or reuse one of the same name), returning its id.
    async fn create_collection(&self, name: &str) -> Result<String, LibraryError>;

    /// Items currently in a collection.
    async fn collection_items(&self, collection_id: &str)
        -> Result<Vec<LibraryItem>, LibraryError>;

    /// Add an item to a collection; a no-op when it is already present.
    async fn add_to_collection(
        &self,
        collection_id: &str,
        item_id: &str,
    ) -> Result<(), LibraryError>;

    /// Kick off a full library scan.
    async fn trigger_library_scan(&self) -> Result<(), LibraryError>;

    /// Movies whose name collides with an earlier entry.
    async fn find_duplicate_items(&self) -> Result<Vec<LibraryItem>, LibraryError>;

    /// Delete an item from the library.
    async fn delete_item(&self, item_id: &str) -> Result<(), LibraryError>;
}

/// Errors that can occur when interacting with the library service.
#[derive(Debug, Error)]
pub enum LibraryError {
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

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}
