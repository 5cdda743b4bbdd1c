//! Mock site adapter for tests.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::search::types::{SearchCandidate, SiteAdapter, SiteError};

/// Configurable in-memory site adapter.
///
/// Records every query it receives; returns the configured result set, or
/// a one-shot injected error.
pub struct MockSiteAdapter {
    name: &'static str,
    results: RwLock<Vec<SearchCandidate>>,
    next_error: RwLock<Option<SiteError>>,
    queries: RwLock<Vec<String>>,
}

impl MockSiteAdapter {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            results: RwLock::new(Vec::new()),
            next_error: RwLock::new(None),
            queries: RwLock::new(Vec::new()),
        }
    }

    /// Builder-style result configuration.
    pub fn with_results(mut self, results: Vec<SearchCandidate>) -> Self {
        self.results = RwLock::new(results);
        self
    }

    /// Replace the configured results.
    pub async fn set_results(&self, results: Vec<SearchCandidate>) {
        *self.results.write().await = results;
    }

    /// Fail the next search with the given error.
    pub async fn set_next_error(&self, error: SiteError) {
        *self.next_error.write().await = Some(error);
    }

    /// All queries this adapter has received.
    pub async fn recorded_queries(&self) -> Vec<String> {
        self.queries.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.queries.read().await.len()
    }
}

#[async_trait]
impl SiteAdapter for MockSiteAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, SiteError> {
        self.queries.write().await.push(query.to_string());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        Ok(self.results.read().await.clone())
    }
}
