//! Tunarr API client.
//!
//! Programming payloads are structurally loose on the service side, so
//! they are assembled as `serde_json` values rather than rigid structs.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use async_trait::async_trait;

use super::types::{Channel, ProgramEntry};
use super::{ChannelError, ChannelService};

/// Tunarr client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunarrConfig {
    /// Server base URL, e.g. http://localhost:8000.
    pub base_url: String,
}

/// Tunarr API client.
pub struct TunarrClient {
    client: Client,
    base_url: String,
}

impl TunarrClient {
    pub fn new(config: TunarrConfig) -> Result<Self, ChannelError> {
        if config.base_url.is_empty() {
            return Err(ChannelError::NotConfigured(
                "Tunarr base URL is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ChannelError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ChannelService for TunarrClient {
    async fn list_channels(&self) -> Result<Vec<Channel>, ChannelError> {
        let url = format!("{}/api/channels", self.base_url);
        let response = Self::check(self.client.get(&url).send().await?).await?;

        let channels: Vec<TunarrChannel> = response.json().await.map_err(|e| {
            ChannelError::ParseError(format!("Failed to parse channels response: {}", e))
        })?;
        Ok(channels.into_iter().map(|c| c.into()).collect())
    }

    /// New channels get a fresh uuid and the lowest free number.
    async fn create_channel(&self, name: &str, group: &str) -> Result<Channel, ChannelError> {
        let existing = self.list_channels().await?;
        if let Some(channel) = existing.iter().find(|c| c.name.eq_ignore_ascii_case(name)) {
            debug!("Channel '{}' already exists ({})", name, channel.id);
            return Ok(channel.clone());
        }

        let number = next_free_number(&existing);
        let id = Uuid::new_v4().to_string();
        let url = format!("{}/api/channels", self.base_url);
        let payload = json!({
            "id": id,
            "name": name,
            "number": number,
            "startTime": chrono::Utc::now().timestamp_millis(),
            "duration": 0,
            "programCount": 0,
            "icon": { "path": "", "width": 0, "duration": 0, "position": "bottom-right" },
            "guideMinimumDuration": 30000,
            "fillerRepeatCooldown": 30000,
            "groupTitle": group,
            "disableFillerOverlay": false,
            "offline": { "mode": "pic" },
            "stealth": false,
            "onDemand": { "enabled": false },
            "streamMode": "hls",
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        Self::check(response).await?;

        info!("Created channel '{}' (#{}, {})", name, number, id);
        Ok(Channel {
            id,
            name: name.to_string(),
            number,
        })
    }

    async fn list_program_titles(
        &self,
        channel_id: &str,
    ) -> Result<Vec<String>, ChannelError> {
        let url = format!("{}/api/channels/{}/programming", self.base_url, channel_id);
        let response = self.client.get(&url).send().await?;

        if response.status().as_u16() == 404 {
            return Err(ChannelError::NotFound(format!("Channel {}", channel_id)));
        }
        let response = Self::check(response).await?;

        let body: serde_json::Value = response.json().await.map_err(|e| {
            ChannelError::ParseError(format!("Failed to parse programming response: {}", e))
        })?;
        Ok(extract_program_titles(&body))
    }

    async fn append_program(
        &self,
        channel: &Channel,
        entry: &ProgramEntry,
    ) -> Result<(), ChannelError> {
        let url = format!(
            "{}/api/channels/{}/programming",
            self.base_url, channel.id
        );
        let program = json!({
            "type": "content",
            "subtype": "movie",
            "persisted": false,
            "title": entry.title,
            "duration": entry.duration_ms,
            "date": entry.release_date,
            "rating": entry.certification,
            "summary": entry.overview,
            "externalSourceType": "jellyfin",
            "externalKey": entry.library_item_id,
            "uniqueId": format!("jellyfin|{}", entry.library_item_id),
            "id": format!("jellyfin|{}", entry.library_item_id),
            "externalIds": entry.imdb_id.as_ref().map(|imdb| vec![json!({
                "type": "single",
                "source": "imdb",
                "id": imdb,
            })]).unwrap_or_default(),
        });
        let payload = json!({
            "type": "manual",
            "append": true,
            "programs": [program],
            "lineup": [{ "duration": entry.duration_ms, "index": 0 }],
        });

        debug!("Programming '{}' onto channel '{}'", entry.title, channel.name);
        let response = self.client.post(&url).json(&payload).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn normalize_channel_numbers(&self) -> Result<u32, ChannelError> {
        let mut channels = self.list_channels().await?;
        channels.sort_by_key(|c| c.number);

        let mut updated = 0;
        for (idx, channel) in channels.iter().enumerate() {
            let wanted = idx as u32 + 1;
            if channel.number == wanted {
                continue;
            }
            let url = format!("{}/api/channels/{}", self.base_url, channel.id);
            let response = self
                .client
                .put(&url)
                .json(&json!({ "number": wanted }))
                .send()
                .await?;
            Self::check(response).await?;
            debug!(
                "Renumbered channel '{}' {} -> {}",
                channel.name, channel.number, wanted
            );
            updated += 1;
        }
        Ok(updated)
    }
}

/// Lowest positive channel number not already taken.
fn next_free_number(existing: &[Channel]) -> u32 {
    let taken: std::collections::HashSet<u32> =
        existing.iter().map(|c| c.number).collect();
    (1..).find(|n| !taken.contains(n)).unwrap_or(1)
}

/// Collect program titles from a programming response, tolerating both the
/// keyed-programs and flat-lineup layouts the service has used.
fn extract_program_titles(body: &serde_json::Value) -> Vec<String> {
    let mut titles = Vec::new();

    if let Some(programs) = body.get("programs") {
        match programs {
            serde_json::Value::Array(items) => {
                for item in items {
                    if let Some(title) = item.get("title").and_then(|t| t.as_str()) {
                        titles.push(title.to_string());
                    }
                }
            }
            serde_json::Value::Object(map) => {
                for item in map.values() {
                    if let Some(title) = item.get("title").and_then(|t| t.as_str()) {
                        titles.push(title.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    titles
}

// ============================================================================
// Tunarr API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct TunarrChannel {
    id: String,
    name: String,
    number: u32,
}

impl From<TunarrChannel> for Channel {
    fn from(c: TunarrChannel) -> Self {
        Self {
            id: c.id,
            name: c.name,
            number: c.number,
        }
    }
}
