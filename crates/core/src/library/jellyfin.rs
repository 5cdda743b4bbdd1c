//! Jellyfin API client.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use async_trait::async_trait;

use super::types::{duplicate_items, LibraryItem, MatchMode};
use super::{LibraryError, LibraryService};

/// Jellyfin client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JellyfinConfig {
    /// Server base URL, e.g. http://localhost:8096.
    pub base_url: String,
    /// API key (required).
    pub api_key: String,
    /// Title matching mode for ownership checks.
    #[serde(default)]
    pub match_mode: MatchMode,
}

/// Jellyfin API client.
pub struct JellyfinClient {
    client: Client,
    base_url: String,
    api_key: String,
    match_mode: MatchMode,
}

impl JellyfinClient {
    pub fn new(config: JellyfinConfig) -> Result<Self, LibraryError> {
        if config.api_key.is_empty() {
            return Err(LibraryError::NotConfigured(
                "Jellyfin API key is required".to_string(),
            ));
        }
        if config.base_url.is_empty() {
            return Err(LibraryError::NotConfigured(
                "Jellyfin base URL is required".to_string(),
            ));
        }

        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            match_mode: config.match_mode,
        })
    }

    async fn get_items(&self, query: &[(&str, &str)]) -> Result<Vec<LibraryItem>, LibraryError> {
        let url = format!("{}/Items", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("X-Emby-Token", &self.api_key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LibraryError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let items: JfItemsResponse = response.json().await.map_err(|e| {
            LibraryError::ParseError(format!("Failed to parse items response: {}", e))
        })?;
        Ok(items.items.into_iter().map(|i| i.into()).collect())
    }

    /// Find a collection by exact name.
    pub async fn find_collection(
        &self,
        name: &str,
    ) -> Result<Option<LibraryItem>, LibraryError> {
        let collections = self
            .get_items(&[("IncludeItemTypes", "BoxSet"), ("Recursive", "true")])
            .await?;
        Ok(collections
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name)))
    }
}

#[async_trait]
impl LibraryService for JellyfinClient {
    async fn find_item_by_title(
        &self,
        title: &str,
    ) -> Result<Option<LibraryItem>, LibraryError> {
        debug!("Jellyfin lookup: '{}'", title);
        let items = self
            .get_items(&[
                ("searchTerm", title),
                ("IncludeItemTypes", "Movie"),
                ("Recursive", "true"),
            ])
            .await?;

        Ok(items
            .into_iter()
            .find(|item| self.match_mode.matches(title, &item.name)))
    }

    async fn list_movies(&self) -> Result<Vec<LibraryItem>, LibraryError> {
        self.get_items(&[("IncludeItemTypes", "Movie"), ("Recursive", "true")])
            .await
    }

    async fn create_collection(&self, name: &str) -> Result<String, LibraryError> {
        if let Some(existing) = self.find_collection(name).await? {
            debug!("Collection '{}' already exists ({})", name, existing.id);
            return Ok(existing.id);
        }

        let url = format!("{}/Collections", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("X-Emby-Token", &self.api_key)
            .query(&[("Name", name)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LibraryError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let created: JfCreatedCollection = response.json().await.map_err(|e| {
            LibraryError::ParseError(format!("Failed to parse collection response: {}", e))
        })?;
        info!("Created collection '{}' ({})", name, created.id);
        Ok(created.id)
    }

    async fn collection_items(
        &self,
        collection_id: &str,
    ) -> Result<Vec<LibraryItem>, LibraryError> {
        self.get_items(&[("ParentId", collection_id)]).await
    }

    async fn add_to_collection(
        &self,
        collection_id: &str,
        item_id: &str,
    ) -> Result<(), LibraryError> {
        let present = self
            .collection_items(collection_id)
            .await?
            .iter()
            .any(|i| i.id == item_id);
        if present {
            debug!("Item {} already in collection {}", item_id, collection_id);
            return Ok(());
        }

        let url = format!("{}/Collections/{}/Items", self.base_url, collection_id);
        let response = self
            .client
            .post(&url)
            .header("X-Emby-Token", &self.api_key)
            .query(&[("Ids", item_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LibraryError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(())
    }

    async fn trigger_library_scan(&self) -> Result<(), LibraryError> {
        let url = format!("{}/Library/Refresh", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("X-Emby-Token", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LibraryError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }
        info!("Library scan triggered");
        Ok(())
    }

    async fn find_duplicate_items(&self) -> Result<Vec<LibraryItem>, LibraryError> {
        let movies = self.list_movies().await?;
        Ok(duplicate_items(&movies))
    }

    async fn delete_item(&self, item_id: &str) -> Result<(), LibraryError> {
        let url = format!("{}/Items/{}", self.base_url, item_id);
        let response = self
            .client
            .delete(&url)
            .header("X-Emby-Token", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(LibraryError::NotFound(format!("Item {}", item_id)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LibraryError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }
        info!("Deleted library item {}", item_id);
        Ok(())
    }
}

// ============================================================================
// Jellyfin API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct JfItemsResponse {
    #[serde(rename = "Items", default)]
    items: Vec<JfItem>,
}

#[derive(Debug, Deserialize)]
struct JfItem {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "ProductionYear")]
    production_year: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct JfCreatedCollection {
    #[serde(rename = "Id")]
    id: String,
}

impl From<JfItem> for LibraryItem {
    fn from(i: JfItem) -> Self {
        Self {
            id: i.id,
            name: i.name,
            year: i.production_year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_api_key_and_url() {
        let result = JellyfinClient::new(JellyfinConfig {
            base_url: "http://localhost:8096".to_string(),
            api_key: String::new(),
            match_mode: MatchMode::Exact,
        });
        assert!(matches!(result, Err(LibraryError::NotConfigured(_))));

        let result = JellyfinClient::new(JellyfinConfig {
            base_url: String::new(),
            api_key: "key".to_string(),
            match_mode: MatchMode::Exact,
        });
        assert!(matches!(result, Err(LibraryError::NotConfigured(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = JellyfinClient::new(JellyfinConfig {
            base_url: "http://localhost:8096/".to_string(),
            api_key: "key".to_string(),
            match_mode: MatchMode::Exact,
        })
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:8096");
    }

    #[test]
    fn test_items_response_parsing() {
        let json = r#"{"Items":[{"Id":"abc","Name":"The Matrix","ProductionYear":1999}],"TotalRecordCount":1}"#;
        let parsed: JfItemsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.items.len(), 1);

        let item: LibraryItem = parsed.items.into_iter().next().unwrap().into();
        assert_eq!(item.id, "abc");
        assert_eq!(item.year, Some(1999));
    }
}
