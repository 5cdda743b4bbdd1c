//! Public catalog types.

use serde::{Deserialize, Serialize};

/// A keyword as known to the catalog service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub id: u32,
    pub name: String,
}

/// A person as known to the catalog service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonMatch {
    pub id: u32,
    pub name: String,
    /// Service-side popularity score, used to order ambiguous matches.
    pub popularity: f32,
}

/// A movie as it appears in discovery and credit listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: u32,
    pub title: String,
    /// Release date (YYYY-MM-DD) when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    pub popularity: f32,
}

impl MovieSummary {
    /// Release year parsed out of the release date.
    pub fn year(&self) -> Option<u32> {
        self.release_date
            .as_ref()
            .and_then(|d| d.get(0..4))
            .and_then(|y| y.parse().ok())
    }
}

/// One page of a keyword discovery listing.
#[derive(Debug, Clone)]
pub struct MoviePage {
    pub page: u32,
    pub total_pages: u32,
    pub movies: Vec<MovieSummary>,
}

/// Full movie details, enough to build a channel program entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetails {
    pub id: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// US certification (e.g. "PG-13") when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
}

impl MovieDetails {
    pub fn year(&self) -> Option<u32> {
        self.release_date
            .as_ref()
            .and_then(|d| d.get(0..4))
            .and_then(|y| y.parse().ok())
    }
}
