//! Activation pipeline: turn a ranked candidate list into at most one
//! accepted submission on the debrid service.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::retry::retry_with_backoff;
use crate::search::magnet;
use crate::search::SearchCandidate;

use super::types::{DebridClient, DebridError};

const DEFAULT_ACTIVE_LIMIT: u32 = 100;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Outcome of one activation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationResult {
    /// Whether the content is (now or already) active on the service.
    pub success: bool,
    /// Service-side id of a fresh submission. None when the content was
    /// already active or every candidate was exhausted.
    pub external_id: Option<String>,
    /// The content was on the service before this run.
    pub already_active: bool,
}

impl ActivationResult {
    fn activated(id: String) -> Self {
        Self {
            success: true,
            external_id: Some(id),
            already_active: false,
        }
    }

    fn already_active() -> Self {
        Self {
            success: true,
            external_id: None,
            already_active: true,
        }
    }

    fn exhausted() -> Self {
        Self {
            success: false,
            external_id: None,
            already_active: false,
        }
    }
}

/// Walks a ranked candidate list, submitting until the service accepts one.
///
/// Submissions are serialized through an internal lock: concurrent movie
/// workers may all search in parallel, but the debrid backend sees one
/// control call at a time.
pub struct ActivationPipeline {
    client: Arc<dyn DebridClient>,
    active_limit: u32,
    max_attempts: u32,
    initial_backoff: Duration,
    submit_lock: Mutex<()>,
}

impl ActivationPipeline {
    pub fn new(client: Arc<dyn DebridClient>) -> Self {
        Self {
            client,
            active_limit: DEFAULT_ACTIVE_LIMIT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            submit_lock: Mutex::new(()),
        }
    }

    pub fn with_active_limit(mut self, limit: u32) -> Self {
        self.active_limit = limit;
        self
    }

    pub fn with_retry(mut self, max_attempts: u32, initial_backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.initial_backoff = initial_backoff;
        self
    }

    /// Activate the best acceptable candidate.
    ///
    /// Candidates are taken in the given (ranked) order and the first
    /// acceptance wins. A candidate whose hash is already active on the
    /// service short-circuits without submitting anything; a candidate
    /// without an extractable hash is skipped; a transient submission
    /// failure is retried with backoff before moving on. Running out of
    /// candidates is a non-error outcome with `success == false`.
    pub async fn activate(
        &self,
        candidates: &[SearchCandidate],
    ) -> Result<ActivationResult, DebridError> {
        if candidates.is_empty() {
            metrics::ACTIVATIONS.with_label_values(&["exhausted"]).inc();
            return Ok(ActivationResult::exhausted());
        }

        let active_hashes: HashSet<String> = self
            .client
            .list_active(self.active_limit)
            .await?
            .into_iter()
            .map(|t| t.hash)
            .collect();

        let mut attempted: HashSet<String> = HashSet::new();
        for candidate in candidates {
            let hash = match magnet::extract_info_hash(&candidate.magnet_uri) {
                Some(h) => h,
                None => {
                    debug!(
                        "Skipping '{}' ({}): no extractable info hash",
                        candidate.name, candidate.source
                    );
                    continue;
                }
            };

            if active_hashes.contains(&hash) {
                info!(
                    "'{}' already active on {} (hash {})",
                    candidate.name,
                    self.client.name(),
                    hash
                );
                metrics::ACTIVATIONS
                    .with_label_values(&["already_active"])
                    .inc();
                return Ok(ActivationResult::already_active());
            }

            // Same hash offered by several sources: one submission is enough.
            if !attempted.insert(hash.clone()) {
                debug!("Hash {} already attempted this run", hash);
                continue;
            }

            let _serialized = self.submit_lock.lock().await;
            let submitted = retry_with_backoff(self.max_attempts, self.initial_backoff, || {
                let client = Arc::clone(&self.client);
                let uri = candidate.magnet_uri.clone();
                async move {
                    metrics::MAGNET_SUBMISSIONS.inc();
                    match client.submit_magnet(&uri).await {
                        Err(e) if e.is_transient() => Err(e),
                        other => Ok(other),
                    }
                }
            })
            .await;
            let submitted = match submitted {
                Ok(inner) => inner,
                Err(e) => Err(e),
            };

            match submitted {
                Ok(id) => {
                    if let Err(e) = self.client.begin_fetch(&id).await {
                        warn!("begin_fetch failed for {} (continuing): {}", id, e);
                    }
                    info!(
                        "Activated '{}' from {} as {}",
                        candidate.name, candidate.source, id
                    );
                    metrics::ACTIVATIONS.with_label_values(&["activated"]).inc();
                    return Ok(ActivationResult::activated(id));
                }
                // A duplicate rejection racing the active-set check means
                // the content is on the service after all.
                Err(DebridError::Duplicate) => {
                    info!("'{}' reported as duplicate by service", candidate.name);
                    metrics::ACTIVATIONS
                        .with_label_values(&["already_active"])
                        .inc();
                    return Ok(ActivationResult::already_active());
                }
                Err(e) => {
                    warn!(
                        "Submission failed for '{}' ({}): {}",
                        candidate.name, candidate.source, e
                    );
                }
            }
        }

        metrics::ACTIVATIONS.with_label_values(&["exhausted"]).inc();
        Ok(ActivationResult::exhausted())
    }
}
