//! Mock catalog service for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::catalog::{
    CatalogError, CatalogService, KeywordMatch, MovieDetails, MoviePage, MovieSummary,
    PersonMatch,
};

/// In-memory catalog with scripted keyword pages and per-movie details.
pub struct MockCatalogService {
    keywords: RwLock<Vec<KeywordMatch>>,
    people: RwLock<Vec<PersonMatch>>,
    /// Discovery pages in order; page numbers are 1-based.
    pages: RwLock<Vec<Vec<MovieSummary>>>,
    credits: RwLock<HashMap<u32, Vec<MovieSummary>>>,
    details: RwLock<HashMap<u32, MovieDetails>>,
}

impl MockCatalogService {
    pub fn new() -> Self {
        Self {
            keywords: RwLock::new(Vec::new()),
            people: RwLock::new(Vec::new()),
            pages: RwLock::new(Vec::new()),
            credits: RwLock::new(HashMap::new()),
            details: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<KeywordMatch>) -> Self {
        self.keywords = RwLock::new(keywords);
        self
    }

    pub fn with_people(mut self, people: Vec<PersonMatch>) -> Self {
        self.people = RwLock::new(people);
        self
    }

    pub fn with_pages(mut self, pages: Vec<Vec<MovieSummary>>) -> Self {
        self.pages = RwLock::new(pages);
        self
    }

    pub fn with_credits(mut self, person_id: u32, credits: Vec<MovieSummary>) -> Self {
        self.credits.get_mut().insert(person_id, credits);
        self
    }

    pub async fn set_details(&self, details: MovieDetails) {
        self.details.write().await.insert(details.id, details);
    }
}

impl Default for MockCatalogService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogService for MockCatalogService {
    async fn search_keywords(&self, _query: &str) -> Result<Vec<KeywordMatch>, CatalogError> {
        Ok(self.keywords.read().await.clone())
    }

    async fn search_people(&self, _query: &str) -> Result<Vec<PersonMatch>, CatalogError> {
        Ok(self.people.read().await.clone())
    }

    async fn movies_by_keyword(
        &self,
        _keyword_id: u32,
        page: u32,
    ) -> Result<MoviePage, CatalogError> {
        let pages = self.pages.read().await;
        let total_pages = pages.len().max(1) as u32;
        let movies = pages
            .get(page.saturating_sub(1) as usize)
            .cloned()
            .unwrap_or_default();
        Ok(MoviePage {
            page,
            total_pages,
            movies,
        })
    }

    async fn person_movie_credits(
        &self,
        person_id: u32,
    ) -> Result<Vec<MovieSummary>, CatalogError> {
        Ok(self
            .credits
            .read()
            .await
            .get(&person_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn movie_details(&self, movie_id: u32) -> Result<MovieDetails, CatalogError> {
        self.details
            .read()
            .await
            .get(&movie_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("movie {}", movie_id)))
    }
}
