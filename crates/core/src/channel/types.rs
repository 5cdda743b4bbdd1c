//! Public channel types.

use serde::{Deserialize, Serialize};

/// A channel on the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub number: u32,
}

/// One movie scheduled onto a channel, assembled from catalog details and
/// the library item that holds the media.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramEntry {
    pub title: String,
    /// Runtime in milliseconds; the service schedules by duration.
    pub duration_ms: u64,
    pub library_item_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
}

impl ProgramEntry {
    /// Build an entry from catalog movie details plus the owning library
    /// item. Movies without a known runtime cannot be scheduled.
    pub fn from_details(
        details: &crate::catalog::MovieDetails,
        library_item_id: &str,
    ) -> Option<Self> {
        let runtime_minutes = details.runtime_minutes.filter(|&m| m > 0)?;
        Some(Self {
            title: details.title.clone(),
            duration_ms: u64::from(runtime_minutes) * 60_000,
            library_item_id: library_item_id.to_string(),
            release_date: details.release_date.clone(),
            certification: details.certification.clone(),
            overview: details.overview.clone(),
            imdb_id: details.imdb_id.clone(),
        })
    }
}
