//! Batch orchestration.
//!
//! Resolves a keyword or person into a movie list, acquires each movie
//! concurrently, then groups the results into a library collection and a
//! continuously running channel.

mod runner;
mod types;

pub use runner::BatchRunner;
pub use types::{channel_name, BatchReport, CleanupReport, MovieOutcome, MovieTask};
