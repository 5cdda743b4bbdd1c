//! YTS adapter.
//!
//! The only JSON source: a public movie API listing per-quality torrents as
//! bare info hashes, so magnets are constructed rather than scraped.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::proxy::HttpFactory;
use crate::search::magnet;
use crate::search::quality::QualityPolicy;
use crate::search::types::{SearchCandidate, SiteAdapter, SiteError};

use super::MAX_CANDIDATES_PER_SITE;

const SOURCE: &str = "yts";
const DEFAULT_BASE_URL: &str = "https://yts.mx";

pub struct YtsAdapter {
    http: Arc<HttpFactory>,
    policy: Arc<QualityPolicy>,
    base_url: String,
}

impl YtsAdapter {
    pub fn new(http: Arc<HttpFactory>, policy: Arc<QualityPolicy>) -> Self {
        Self {
            http,
            policy,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SiteAdapter for YtsAdapter {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, SiteError> {
        let url = format!("{}/api/v2/list_movies.json", self.base_url);
        debug!("YTS search: query='{}'", query);

        let client = self.http.client().await.map_err(SiteError::from)?;
        let response = client
            .get(&url)
            .query(&[("query_term", query)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SiteError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        parse_listing(&body, query, &self.policy)
    }
}

/// Turn a YTS API response into quality-filtered candidates. Only movies
/// whose title matches the query, or is contained in it (the query usually
/// carries a year suffix the API title lacks), contribute.
fn parse_listing(
    body: &str,
    query: &str,
    policy: &QualityPolicy,
) -> Result<Vec<SearchCandidate>, SiteError> {
    let response: YtsResponse = serde_json::from_str(body)
        .map_err(|e| SiteError::ParseError(format!("YTS response: {}", e)))?;

    if response.status != "ok" {
        return Err(SiteError::ParseError(format!(
            "YTS API status '{}'",
            response.status
        )));
    }

    let movies = response
        .data
        .and_then(|d| d.movies)
        .unwrap_or_default();
    let wanted = query.to_lowercase();

    let mut candidates = Vec::new();
    for movie in movies {
        let movie_title = movie.title.to_lowercase();
        if movie_title != wanted && !wanted.contains(&movie_title) {
            continue;
        }
        for torrent in movie.torrents.unwrap_or_default() {
            let seeders = torrent.seeds.unwrap_or(0);
            let name = format!("{} [{}] [YTS]", movie.title, torrent.quality);
            if !policy.accepts(&name, seeders) {
                continue;
            }
            candidates.push(SearchCandidate {
                name,
                seeders,
                magnet_uri: magnet::from_info_hash(&torrent.hash, &movie.title),
                source: SOURCE,
            });
        }
    }

    candidates.sort_by(|a, b| b.seeders.cmp(&a.seeders));
    candidates.truncate(MAX_CANDIDATES_PER_SITE);
    Ok(candidates)
}

#[derive(Debug, Deserialize)]
struct YtsResponse {
    status: String,
    data: Option<YtsData>,
}

#[derive(Debug, Deserialize)]
struct YtsData {
    movies: Option<Vec<YtsMovie>>,
}

#[derive(Debug, Deserialize)]
struct YtsMovie {
    title: String,
    torrents: Option<Vec<YtsTorrent>>,
}

#[derive(Debug, Deserialize)]
struct YtsTorrent {
    hash: String,
    quality: String,
    seeds: Option<u32>,
}
