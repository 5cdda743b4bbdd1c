//! Real-Debrid REST client.
//!
//! Control calls (submit, select, delete) use short timeouts: the batch
//! runner would rather skip a candidate than stall a worker on a slow
//! backend response.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{AccountInfo, ActiveTorrent, DebridClient, DebridError};

const DEFAULT_BASE_URL: &str = "https://api.real-debrid.com/rest/1.0";
const CONTROL_TIMEOUT: Duration = Duration::from_secs(3);
const LISTING_TIMEOUT: Duration = Duration::from_secs(8);

/// Real-Debrid client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealDebridConfig {
    /// API token (required).
    pub api_token: String,
    /// Base URL override, mainly for tests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

pub struct RealDebridClient {
    control: Client,
    listing: Client,
    base_url: String,
    api_token: String,
}

impl RealDebridClient {
    pub fn new(config: RealDebridConfig) -> Result<Self, DebridError> {
        if config.api_token.is_empty() {
            return Err(DebridError::AuthenticationFailed(
                "Real-Debrid API token is required".to_string(),
            ));
        }

        let control = Client::builder().timeout(CONTROL_TIMEOUT).build()?;
        let listing = Client::builder().timeout(LISTING_TIMEOUT).build()?;

        Ok(Self {
            control,
            listing,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_token: config.api_token,
        })
    }

    fn map_status(status: reqwest::StatusCode, body: String) -> DebridError {
        match status.as_u16() {
            401 | 403 => DebridError::AuthenticationFailed(body),
            503 => DebridError::ServiceUnavailable(body),
            code => DebridError::ApiError {
                status: code,
                message: body,
            },
        }
    }
}

#[async_trait]
impl DebridClient for RealDebridClient {
    fn name(&self) -> &str {
        "real-debrid"
    }

    async fn account(&self) -> Result<AccountInfo, DebridError> {
        let url = format!("{}/user", self.base_url);
        let response = self
            .listing
            .get(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }

        let user: RdUser = response
            .json()
            .await
            .map_err(|e| DebridError::Internal(format!("user response: {}", e)))?;
        Ok(user.into())
    }

    async fn list_active(&self, limit: u32) -> Result<Vec<ActiveTorrent>, DebridError> {
        let url = format!("{}/torrents", self.base_url);
        debug!("Real-Debrid list torrents, limit={}", limit);

        let response = self
            .listing
            .get(&url)
            .query(&[("limit", limit.to_string())])
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        let status = response.status();
        // 204 means an empty torrent list.
        if status.as_u16() == 204 {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }

        let torrents: Vec<RdTorrent> = response
            .json()
            .await
            .map_err(|e| DebridError::Internal(format!("torrents response: {}", e)))?;
        Ok(torrents.into_iter().map(|t| t.into()).collect())
    }

    async fn submit_magnet(&self, uri: &str) -> Result<String, DebridError> {
        let url = format!("{}/torrents/addMagnet", self.base_url);
        debug!("Real-Debrid addMagnet");

        let response = self
            .control
            .post(&url)
            .bearer_auth(&self.api_token)
            .form(&[("magnet", uri)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.contains("already_added") {
                return Err(DebridError::Duplicate);
            }
            return Err(Self::map_status(status, body));
        }

        let added: RdAdded = response
            .json()
            .await
            .map_err(|e| DebridError::Internal(format!("addMagnet response: {}", e)))?;
        Ok(added.id)
    }

    async fn begin_fetch(&self, id: &str) -> Result<(), DebridError> {
        let url = format!("{}/torrents/selectFiles/{}", self.base_url, id);
        debug!("Real-Debrid selectFiles id={}", id);

        let response = self
            .control
            .post(&url)
            .bearer_auth(&self.api_token)
            .form(&[("files", "all")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), DebridError> {
        let url = format!("{}/torrents/delete/{}", self.base_url, id);
        debug!("Real-Debrid delete id={}", id);

        let response = self
            .control
            .delete(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() && status.as_u16() != 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status(status, body));
        }
        Ok(())
    }
}

// ============================================================================
// Real-Debrid API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct RdUser {
    username: String,
    #[serde(rename = "type")]
    account_type: String,
    expiration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RdTorrent {
    id: String,
    filename: String,
    hash: String,
    status: String,
    progress: Option<f64>,
    added: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RdAdded {
    id: String,
}

fn parse_rd_date(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl From<RdUser> for AccountInfo {
    fn from(u: RdUser) -> Self {
        Self {
            premium: u.account_type == "premium",
            expiration: parse_rd_date(u.expiration),
            username: u.username,
        }
    }
}

impl From<RdTorrent> for ActiveTorrent {
    fn from(t: RdTorrent) -> Self {
        Self {
            id: t.id,
            name: t.filename,
            hash: t.hash.to_lowercase(),
            status: t.status,
            progress: t.progress.unwrap_or(0.0),
            added_at: parse_rd_date(t.added),
        }
    }
}
