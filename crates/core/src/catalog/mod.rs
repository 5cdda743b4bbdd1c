//! Catalog service integration (TMDB).
//!
//! Resolves keywords and people to movie lists and provides per-movie
//! details for channel programming.

mod tmdb;
mod types;

pub use tmdb::{TmdbClient, TmdbConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Trait for catalog service clients, the seam the orchestrator talks to.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Search for keywords matching a term.
    async fn search_keywords(&self, query: &str) -> Result<Vec<KeywordMatch>, CatalogError>;

    /// Search for people matching a name, most popular first.
    async fn search_people(&self, query: &str) -> Result<Vec<PersonMatch>, CatalogError>;

    /// One page of movies tagged with a keyword, most popular first.
    async fn movies_by_keyword(
        &self,
        keyword_id: u32,
        page: u32,
    ) -> Result<MoviePage, CatalogError>;

    /// All movies a person acted in, most popular first.
    async fn person_movie_credits(
        &self,
        person_id: u32,
    ) -> Result<Vec<MovieSummary>, CatalogError>;

    /// Full details for one movie.
    async fn movie_details(&self, movie_id: u32) -> Result<MovieDetails, CatalogError>;
}

/// Errors that can occur when interacting with the catalog service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

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
