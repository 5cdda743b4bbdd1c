//! Fan-out search across every registered site, merged into one ranked list.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::metrics;

use super::normalize_query;
use super::types::{AggregateResult, SearchCandidate, SiteAdapter, SiteError};

const DEFAULT_CONCURRENCY: usize = 4;

/// Owns the registered site adapters and runs one query against all of
/// them. A failed site becomes an entry in `source_errors` and an empty
/// contribution; nothing short of every future panicking aborts a search.
pub struct SearchAggregator {
    adapters: Vec<Arc<dyn SiteAdapter>>,
    concurrency: usize,
}

impl SearchAggregator {
    pub fn new(adapters: Vec<Arc<dyn SiteAdapter>>) -> Self {
        Self {
            adapters,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Registered source names, in registration order.
    pub fn sources(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Normalize the query, dispatch it to every site, merge and rank.
    ///
    /// Ranking is a stable sort by seeders descending, so ties keep
    /// adapter registration order and, within one site, its native listing
    /// order.
    pub async fn search_all(&self, raw_query: &str) -> AggregateResult {
        let query = normalize_query(raw_query);
        debug!("Aggregate search: '{}' -> '{}'", raw_query, query);
        let started = Instant::now();

        let searches = self.adapters.iter().enumerate().map(|(idx, adapter)| {
            let adapter = Arc::clone(adapter);
            let query = query.clone();
            async move {
                let outcome = adapter.search(&query).await;
                (idx, adapter.name(), outcome)
            }
        });

        let mut outcomes: Vec<(usize, &'static str, Result<Vec<SearchCandidate>, SiteError>)> =
            stream::iter(searches)
                .buffer_unordered(self.concurrency)
                .collect()
                .await;
        outcomes.sort_by_key(|(idx, _, _)| *idx);

        let mut candidates = Vec::new();
        let mut source_errors = HashMap::new();
        for (_, name, outcome) in outcomes {
            match outcome {
                Ok(mut found) => {
                    debug!("{}: {} candidate(s) for '{}'", name, found.len(), query);
                    metrics::SITE_SEARCHES.with_label_values(&[name, "ok"]).inc();
                    candidates.append(&mut found);
                }
                Err(e) => {
                    warn!("{}: search failed: {}", name, e);
                    metrics::SITE_SEARCHES
                        .with_label_values(&[name, "error"])
                        .inc();
                    source_errors.insert(name.to_string(), e.to_string());
                }
            }
        }

        candidates.sort_by(|a, b| b.seeders.cmp(&a.seeders));

        let duration_ms = started.elapsed().as_millis() as u64;
        metrics::AGGREGATE_DURATION
            .with_label_values(&[])
            .observe(duration_ms as f64 / 1000.0);
        metrics::CANDIDATES_PER_SEARCH
            .with_label_values(&[])
            .observe(candidates.len() as f64);

        AggregateResult {
            candidates,
            source_errors,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSiteAdapter;

    fn candidate(name: &str, seeders: u32, source: &'static str) -> SearchCandidate {
        SearchCandidate {
            name: name.to_string(),
            seeders,
            magnet_uri: format!(
                "magnet:?xt=urn:btih:{:040x}&dn={}",
                seeders as u64 + 0xabc,
                name
            ),
            source,
        }
    }

    #[tokio::test]
    async fn test_merges_and_ranks_by_seeders() {
        let a = Arc::new(
            MockSiteAdapter::new("site_a")
                .with_results(vec![candidate("A1", 10, "site_a"), candidate("A2", 90, "site_a")]),
        );
        let b = Arc::new(
            MockSiteAdapter::new("site_b").with_results(vec![candidate("B1", 50, "site_b")]),
        );

        let aggregator = SearchAggregator::new(vec![a as Arc<dyn SiteAdapter>, b]);
        let result = aggregator.search_all("some movie").await;

        let names: Vec<&str> = result.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A2", "B1", "A1"]);
        assert!(result.source_errors.is_empty());
    }

    #[tokio::test]
    async fn test_equal_seeders_keep_registration_order() {
        let a = Arc::new(
            MockSiteAdapter::new("site_a").with_results(vec![candidate("A1", 30, "site_a")]),
        );
        let b = Arc::new(
            MockSiteAdapter::new("site_b").with_results(vec![candidate("B1", 30, "site_b")]),
        );

        let aggregator = SearchAggregator::new(vec![a as Arc<dyn SiteAdapter>, b]);
        let result = aggregator.search_all("tied").await;

        assert_eq!(result.candidates[0].source, "site_a");
        assert_eq!(result.candidates[1].source, "site_b");
    }

    #[tokio::test]
    async fn test_failed_site_is_isolated() {
        let ok = Arc::new(
            MockSiteAdapter::new("healthy").with_results(vec![candidate("H1", 12, "healthy")]),
        );
        let broken = Arc::new(MockSiteAdapter::new("broken"));
        broken
            .set_next_error(SiteError::ConnectionFailed("refused".to_string()))
            .await;

        let aggregator =
            SearchAggregator::new(vec![Arc::clone(&broken) as Arc<dyn SiteAdapter>, ok]);
        let result = aggregator.search_all("movie").await;

        assert_eq!(result.candidates.len(), 1);
        assert_eq!(result.candidates[0].name, "H1");
        assert!(result.source_errors["broken"].contains("refused"));
    }

    #[tokio::test]
    async fn test_all_sites_empty_yields_empty_result() {
        let a = Arc::new(MockSiteAdapter::new("site_a"));
        let b = Arc::new(MockSiteAdapter::new("site_b"));

        let aggregator = SearchAggregator::new(vec![a as Arc<dyn SiteAdapter>, b]);
        let result = aggregator.search_all("obscure title").await;

        assert!(result.candidates.is_empty());
        assert!(result.source_errors.is_empty());
    }

    #[tokio::test]
    async fn test_adapters_receive_normalized_query() {
        let a = Arc::new(MockSiteAdapter::new("site_a"));
        let aggregator = SearchAggregator::new(vec![Arc::clone(&a) as Arc<dyn SiteAdapter>]);

        aggregator.search_all("Léon: The Professional").await;

        let queries = a.recorded_queries().await;
        assert_eq!(queries, vec!["Leon The Professional".to_string()]);
    }
}
