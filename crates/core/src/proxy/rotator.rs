//! Rotating pool of public HTTP proxies.
//!
//! The pool is scraped from a provider endpoint that returns one
//! `host:port` per line, cached for a refresh interval, and handed out
//! round-robin. Proxy use is strictly best-effort: an unreachable provider
//! or an empty pool means callers proceed without a proxy.

use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use reqwest::Client;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::metrics;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const PROBE_CONCURRENCY: usize = 8;

/// Errors surfaced by rotator construction. Refresh failures at runtime are
/// logged and absorbed instead.
#[derive(Debug, Error)]
pub enum RotatorError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

struct PoolState {
    proxies: Vec<String>,
    cursor: usize,
    fetched_at: Option<Instant>,
}

/// Shared round-robin proxy pool with time-based refresh.
pub struct ProxyRotator {
    http: Client,
    provider_url: String,
    echo_url: String,
    refresh_interval: Duration,
    state: Mutex<PoolState>,
}

impl ProxyRotator {
    pub fn new(
        provider_url: String,
        echo_url: String,
        refresh_interval: Duration,
    ) -> Result<Self, RotatorError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| RotatorError::ClientBuild(e.to_string()))?;

        Ok(Self {
            http,
            provider_url,
            echo_url,
            refresh_interval,
            state: Mutex::new(PoolState {
                proxies: Vec::new(),
                cursor: 0,
                fetched_at: None,
            }),
        })
    }

    /// Rotator over a fixed, caller-supplied pool. No provider refresh.
    pub fn with_static_pool(
        proxies: Vec<String>,
        echo_url: String,
    ) -> Result<Self, RotatorError> {
        let mut rotator = Self::new(String::new(), echo_url, Duration::MAX)?;
        rotator.state = Mutex::new(PoolState {
            proxies,
            cursor: 0,
            fetched_at: Some(Instant::now()),
        });
        Ok(rotator)
    }

    /// Next proxy endpoint (`http://host:port`), round-robin. None when the
    /// pool is empty, in which case the caller should connect directly.
    pub async fn get_proxy(&self) -> Option<String> {
        let mut state = self.state.lock().await;

        let stale = match state.fetched_at {
            None => true,
            Some(at) => at.elapsed() >= self.refresh_interval,
        };
        if stale && !self.provider_url.is_empty() {
            self.refresh(&mut state).await;
        }

        if state.proxies.is_empty() {
            return None;
        }

        let endpoint = state.proxies[state.cursor % state.proxies.len()].clone();
        state.cursor = (state.cursor + 1) % state.proxies.len();
        Some(endpoint)
    }

    /// Number of proxies currently pooled.
    pub async fn pool_size(&self) -> usize {
        self.state.lock().await.proxies.len()
    }

    /// Probe every pooled proxy against the echo endpoint, dropping the
    /// ones that fail. Returns the surviving count.
    pub async fn test_proxies(&self) -> usize {
        let candidates = {
            let mut state = self.state.lock().await;
            if state.fetched_at.is_none() && !self.provider_url.is_empty() {
                self.refresh(&mut state).await;
            }
            state.proxies.clone()
        };

        let echo_url = self.echo_url.clone();
        let probes = candidates.into_iter().map(|endpoint| {
            let echo_url = echo_url.clone();
            async move {
                let alive = probe_proxy(&endpoint, &echo_url).await;
                (endpoint, alive)
            }
        });

        let results: Vec<(String, bool)> = stream::iter(probes)
            .buffer_unordered(PROBE_CONCURRENCY)
            .collect()
            .await;

        let alive: Vec<String> = results
            .into_iter()
            .filter_map(|(endpoint, ok)| {
                if !ok {
                    debug!("Dropping dead proxy {}", endpoint);
                }
                ok.then_some(endpoint)
            })
            .collect();

        let mut state = self.state.lock().await;
        state.proxies = alive;
        state.cursor = 0;
        metrics::PROXY_POOL_SIZE.set(state.proxies.len() as i64);
        state.proxies.len()
    }

    async fn refresh(&self, state: &mut PoolState) {
        debug!("Refreshing proxy pool from {}", self.provider_url);
        state.fetched_at = Some(Instant::now());

        let body = match self.http.get(&self.provider_url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.text().await {
                    Ok(body) => body,
                    Err(e) => {
                        warn!("Proxy provider body unreadable: {}", e);
                        return;
                    }
                }
            }
            Ok(response) => {
                warn!("Proxy provider returned HTTP {}", response.status());
                return;
            }
            Err(e) => {
                warn!("Proxy provider unreachable: {}", e);
                return;
            }
        };

        state.proxies = parse_provider_list(&body);
        state.cursor = 0;
        metrics::PROXY_POOL_SIZE.set(state.proxies.len() as i64);
        debug!("Proxy pool refreshed: {} entries", state.proxies.len());
    }
}

async fn probe_proxy(endpoint: &str, echo_url: &str) -> bool {
    let proxy = match reqwest::Proxy::all(endpoint) {
        Ok(p) => p,
        Err(_) => return false,
    };
    let client = match Client::builder().proxy(proxy).timeout(PROBE_TIMEOUT).build() {
        Ok(c) => c,
        Err(_) => return false,
    };
    match client.get(echo_url).send().await {
        Ok(response) => response.status().is_success(),
        Err(_) => false,
    }
}

/// Parse a provider response: one `host:port` per line, blank lines skipped.
fn parse_provider_list(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && line.contains(':'))
        .map(|line| {
            if line.starts_with("http://") || line.starts_with("https://") {
                line.to_string()
            } else {
                format!("http://{}", line)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_rotator(proxies: Vec<&str>) -> ProxyRotator {
        ProxyRotator::with_static_pool(
            proxies.into_iter().map(String::from).collect(),
            "http://127.0.0.1:1/ip".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_provider_list() {
        let body = "1.2.3.4:8080\n\n5.6.7.8:3128\nhttp://9.9.9.9:80\nnot-a-proxy\n";
        let parsed = parse_provider_list(body);
        assert_eq!(
            parsed,
            vec![
                "http://1.2.3.4:8080".to_string(),
                "http://5.6.7.8:3128".to_string(),
                "http://9.9.9.9:80".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_round_robin_rotation() {
        let rotator = static_rotator(vec!["http://a:1", "http://b:2"]);

        assert_eq!(rotator.get_proxy().await.as_deref(), Some("http://a:1"));
        assert_eq!(rotator.get_proxy().await.as_deref(), Some("http://b:2"));
        assert_eq!(rotator.get_proxy().await.as_deref(), Some("http://a:1"));
    }

    #[tokio::test]
    async fn test_empty_pool_yields_none() {
        let rotator = static_rotator(vec![]);
        assert!(rotator.get_proxy().await.is_none());
    }

    #[tokio::test]
    async fn test_pool_size() {
        let rotator = static_rotator(vec!["http://a:1", "http://b:2", "http://c:3"]);
        assert_eq!(rotator.pool_size().await, 3);
    }

    #[tokio::test]
    async fn test_test_proxies_drops_unreachable_members() {
        // Probes run against a closed local port, so every member dies.
        let rotator = static_rotator(vec!["http://127.0.0.1:1", "http://127.0.0.1:2"]);
        assert_eq!(rotator.test_proxies().await, 0);
        assert_eq!(rotator.pool_size().await, 0);
        assert!(rotator.get_proxy().await.is_none());
    }
}
