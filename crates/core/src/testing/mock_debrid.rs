//! Mock debrid client for tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::debrid::types::{AccountInfo, ActiveTorrent, DebridClient, DebridError};

/// Scriptable in-memory debrid backend.
///
/// Submission outcomes are queued front-to-back; once the queue is empty,
/// submissions succeed with generated ids. All calls are recorded.
pub struct MockDebridClient {
    active: RwLock<Vec<ActiveTorrent>>,
    submit_outcomes: RwLock<VecDeque<Result<String, DebridError>>>,
    submit_calls: RwLock<Vec<String>>,
    begin_calls: RwLock<Vec<String>>,
    remove_calls: RwLock<Vec<String>>,
    fail_begin_fetch: RwLock<bool>,
}

impl MockDebridClient {
    pub fn new() -> Self {
        Self {
            active: RwLock::new(Vec::new()),
            submit_outcomes: RwLock::new(VecDeque::new()),
            submit_calls: RwLock::new(Vec::new()),
            begin_calls: RwLock::new(Vec::new()),
            remove_calls: RwLock::new(Vec::new()),
            fail_begin_fetch: RwLock::new(false),
        }
    }

    /// Builder-style active set.
    pub fn with_active(mut self, active: Vec<ActiveTorrent>) -> Self {
        self.active = RwLock::new(active);
        self
    }

    pub async fn set_active(&self, active: Vec<ActiveTorrent>) {
        *self.active.write().await = active;
    }

    /// Queue the outcome for the next unscripted submission.
    pub async fn queue_submit(&self, outcome: Result<String, DebridError>) {
        self.submit_outcomes.write().await.push_back(outcome);
    }

    pub async fn set_fail_begin_fetch(&self, fail: bool) {
        *self.fail_begin_fetch.write().await = fail;
    }

    /// Magnet URIs submitted so far.
    pub async fn submit_calls(&self) -> Vec<String> {
        self.submit_calls.read().await.clone()
    }

    pub async fn begin_fetch_calls(&self) -> Vec<String> {
        self.begin_calls.read().await.clone()
    }

    pub async fn remove_calls(&self) -> Vec<String> {
        self.remove_calls.read().await.clone()
    }
}

impl Default for MockDebridClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DebridClient for MockDebridClient {
    fn name(&self) -> &str {
        "mock-debrid"
    }

    async fn account(&self) -> Result<AccountInfo, DebridError> {
        Ok(AccountInfo {
            username: "mock-user".to_string(),
            premium: true,
            expiration: None,
        })
    }

    async fn list_active(&self, limit: u32) -> Result<Vec<ActiveTorrent>, DebridError> {
        let active = self.active.read().await;
        Ok(active.iter().take(limit as usize).cloned().collect())
    }

    async fn submit_magnet(&self, uri: &str) -> Result<String, DebridError> {
        self.submit_calls.write().await.push(uri.to_string());

        if let Some(outcome) = self.submit_outcomes.write().await.pop_front() {
            return outcome;
        }

        let n = self.submit_calls.read().await.len();
        Ok(format!("mock-id-{}", n))
    }

    async fn begin_fetch(&self, id: &str) -> Result<(), DebridError> {
        self.begin_calls.write().await.push(id.to_string());
        if *self.fail_begin_fetch.read().await {
            return Err(DebridError::Internal("begin_fetch scripted to fail".to_string()));
        }
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), DebridError> {
        self.remove_calls.write().await.push(id.to_string());
        self.active.write().await.retain(|t| t.id != id);
        Ok(())
    }
}
