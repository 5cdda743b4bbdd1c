//! Batch work units and reporting.

use serde::Serialize;

use crate::catalog::MovieSummary;

/// One movie to acquire: the unit of work of a batch run.
#[derive(Debug, Clone)]
pub struct MovieTask {
    /// Catalog id, needed later for channel programming details.
    pub catalog_id: u32,
    pub title: String,
    pub year: Option<u32>,
}

impl MovieTask {
    /// Free-text site query: "{title} {year}" when the year is known, so
    /// wrong-year releases of same-titled movies don't match.
    pub fn search_query(&self) -> String {
        match self.year {
            Some(year) => format!("{} {}", self.title, year),
            None => self.title.clone(),
        }
    }
}

impl From<MovieSummary> for MovieTask {
    fn from(movie: MovieSummary) -> Self {
        let year = movie.year();
        Self {
            catalog_id: movie.id,
            title: movie.title,
            year,
        }
    }
}

/// What happened to one movie during acquisition.
#[derive(Debug, Clone, PartialEq)]
pub enum MovieOutcome {
    /// A fresh submission was accepted by the debrid service.
    Activated,
    /// The content was already active on the service.
    AlreadyActive,
    /// The movie is already in the media library; nothing was searched.
    SkippedExisting,
    /// No site returned an acceptable candidate.
    NoCandidates,
    /// Candidates existed but the service accepted none of them.
    Exhausted,
    /// The pipeline failed outright (listing error, auth failure, ...).
    Failed(String),
}

/// Tally of one batch acquisition run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub activated: usize,
    pub already_active: usize,
    pub skipped_existing: usize,
    pub no_candidates: usize,
    pub exhausted: usize,
    /// Movie title and error message for each hard failure.
    pub failed: Vec<(String, String)>,
}

impl BatchReport {
    pub fn record(&mut self, title: &str, outcome: MovieOutcome) {
        self.attempted += 1;
        match outcome {
            MovieOutcome::Activated => self.activated += 1,
            MovieOutcome::AlreadyActive => self.already_active += 1,
            MovieOutcome::SkippedExisting => self.skipped_existing += 1,
            MovieOutcome::NoCandidates => self.no_candidates += 1,
            MovieOutcome::Exhausted => self.exhausted += 1,
            MovieOutcome::Failed(message) => self.failed.push((title.to_string(), message)),
        }
    }

    /// Movies that are on the debrid service after the run, one way or
    /// another.
    pub fn succeeded(&self) -> usize {
        self.activated + self.already_active
    }
}

/// Tally of a cleanup run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    pub library_items_removed: usize,
    pub torrents_removed: usize,
}

/// Channel name for a batch subject, e.g. "heist" -> "24/7 HEIST".
pub fn channel_name(subject: &str) -> String {
    format!("24/7 {}", subject.trim().to_uppercase())
}
