//! Mock media library for tests.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::library::{duplicate_items, LibraryError, LibraryItem, LibraryService, MatchMode};

struct MockCollection {
    id: String,
    name: String,
    items: Vec<LibraryItem>,
}

/// In-memory media library with collections.
pub struct MockLibraryService {
    items: RwLock<Vec<LibraryItem>>,
    collections: RwLock<Vec<MockCollection>>,
    deleted: RwLock<Vec<String>>,
    scans: RwLock<usize>,
    match_mode: MatchMode,
}

impl MockLibraryService {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            collections: RwLock::new(Vec::new()),
            deleted: RwLock::new(Vec::new()),
            scans: RwLock::new(0),
            match_mode: MatchMode::Exact,
        }
    }

    /// Builder-style initial movie set.
    pub fn with_items(mut self, items: Vec<LibraryItem>) -> Self {
        self.items = RwLock::new(items);
        self
    }

    pub async fn add_item(&self, id: &str, name: &str) {
        self.items.write().await.push(LibraryItem {
            id: id.to_string(),
            name: name.to_string(),
            year: None,
        });
    }

    pub async fn deleted_items(&self) -> Vec<String> {
        self.deleted.read().await.clone()
    }

    pub async fn scan_count(&self) -> usize {
        *self.scans.read().await
    }

    /// Item ids currently in the named collection, empty when it does not
    /// exist.
    pub async fn collection_member_ids(&self, name: &str) -> Vec<String> {
        let collections = self.collections.read().await;
        collections
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.items.iter().map(|i| i.id.clone()).collect())
            .unwrap_or_default()
    }
}

impl Default for MockLibraryService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LibraryService for MockLibraryService {
    async fn find_item_by_title(&self, title: &str) -> Result<Option<LibraryItem>, LibraryError> {
        let items = self.items.read().await;
        Ok(items
            .iter()
            .find(|item| self.match_mode.matches(title, &item.name))
            .cloned())
    }

    async fn list_movies(&self) -> Result<Vec<LibraryItem>, LibraryError> {
        Ok(self.items.read().await.clone())
    }

    async fn create_collection(&self, name: &str) -> Result<String, LibraryError> {
        let mut collections = self.collections.write().await;
        if let Some(existing) = collections.iter().find(|c| c.name.eq_ignore_ascii_case(name)) {
            return Ok(existing.id.clone());
        }
        let id = format!("collection-{}", collections.len() + 1);
        collections.push(MockCollection {
            id: id.clone(),
            name: name.to_string(),
            items: Vec::new(),
        });
        Ok(id)
    }

    async fn collection_items(
        &self,
        collection_id: &str,
    ) -> Result<Vec<LibraryItem>, LibraryError> {
        let collections = self.collections.read().await;
        collections
            .iter()
            .find(|c| c.id == collection_id)
            .map(|c| c.items.clone())
            .ok_or_else(|| LibraryError::NotFound(format!("Collection {}", collection_id)))
    }

    async fn add_to_collection(
        &self,
        collection_id: &str,
        item_id: &str,
    ) -> Result<(), LibraryError> {
        let item = self
            .items
            .read()
            .await
            .iter()
            .find(|i| i.id == item_id)
            .cloned()
            .ok_or_else(|| LibraryError::NotFound(format!("Item {}", item_id)))?;

        let mut collections = self.collections.write().await;
        let collection = collections
            .iter_mut()
            .find(|c| c.id == collection_id)
            .ok_or_else(|| LibraryError::NotFound(format!("Collection {}", collection_id)))?;
        if !collection.items.iter().any(|i| i.id == item_id) {
            collection.items.push(item);
        }
        Ok(())
    }

    async fn trigger_library_scan(&self) -> Result<(), LibraryError> {
        *self.scans.write().await += 1;
        Ok(())
    }

    async fn find_duplicate_items(&self) -> Result<Vec<LibraryItem>, LibraryError> {
        Ok(duplicate_items(&self.items.read().await))
    }

    async fn delete_item(&self, item_id: &str) -> Result<(), LibraryError> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|i| i.id != item_id);
        if items.len() == before {
            return Err(LibraryError::NotFound(format!("Item {}", item_id)));
        }
        self.deleted.write().await.push(item_id.to_string());
        Ok(())
    }
}
