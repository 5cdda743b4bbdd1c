//! Prometheus metrics for core components.
//!
//! Covers the discovery fan-out (per-site searches, aggregate candidate
//! counts), the activation pipeline, the retry helper, and the proxy pool.

use once_cell::sync::Lazy;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
};

// =============================================================================
// Discovery
// =============================================================================

/// Per-site searches by source and result.
pub static SITE_SEARCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("projektor_site_searches_total", "Per-site search attempts"),
        &["source", "result"], // result: "ok", "error"
    )
    .unwrap()
});

/// Aggregate fan-out duration in seconds.
pub static AGGREGATE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "projektor_aggregate_duration_seconds",
            "Duration of the full search fan-out",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 40.0]),
        &[],
    )
    .unwrap()
});

/// Candidates surviving the quality filter per aggregate search.
pub static CANDIDATES_PER_SEARCH: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "projektor_candidates_per_search",
            "Quality-filtered candidates per aggregate search",
        )
        .buckets(vec![0.0, 1.0, 2.0, 3.0, 5.0, 8.0, 12.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Activation
// =============================================================================

/// Activation outcomes.
pub static ACTIVATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("projektor_activations_total", "Activation pipeline outcomes"),
        &["result"], // "activated", "already_active", "exhausted"
    )
    .unwrap()
});

/// Magnet submissions issued to the debrid service.
pub static MAGNET_SUBMISSIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "projektor_magnet_submissions_total",
        "Magnet submissions issued",
    )
    .unwrap()
});

// =============================================================================
// Plumbing
// =============================================================================

/// Retried operations (one increment per re-attempt, not per call).
pub static RETRY_ATTEMPTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("projektor_retry_attempts_total", "Operation re-attempts").unwrap()
});

/// Current proxy pool size.
pub static PROXY_POOL_SIZE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("projektor_proxy_pool_size", "Proxies currently pooled").unwrap()
});

/// All metrics for registration with a prometheus registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SITE_SEARCHES.clone()),
        Box::new(AGGREGATE_DURATION.clone()),
        Box::new(CANDIDATES_PER_SEARCH.clone()),
        Box::new(ACTIVATIONS.clone()),
        Box::new(MAGNET_SUBMISSIONS.clone()),
        Box::new(RETRY_ATTEMPTS.clone()),
        Box::new(PROXY_POOL_SIZE.clone()),
    ]
}
