//! Pirate Bay mirror adapter.
//!
//! HTML listing with the magnet inline in each row, so no second round
//! trip is needed.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use crate::proxy::HttpFactory;
use crate::search::quality::QualityPolicy;
use crate::search::types::{SearchCandidate, SiteAdapter, SiteError};

use super::{MAX_CANDIDATES_PER_SITE, MAX_EXAMINED_ROWS};

const SOURCE: &str = "piratebay";
const DEFAULT_BASE_URL: &str = "https://tpb.party";

pub struct PirateBayAdapter {
    http: Arc<HttpFactory>,
    policy: Arc<QualityPolicy>,
    base_url: String,
}

impl PirateBayAdapter {
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
impl SiteAdapter for PirateBayAdapter {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, SiteError> {
        // Video category 200, sorted by seeders.
        let url = format!(
            "{}/search/{}/1/99/200",
            self.base_url,
            query.replace(' ', "%20")
        );
        debug!("piratebay search: {}", url);

        let client = self.http.client().await.map_err(SiteError::from)?;
        let response = client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SiteError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        let mut candidates = parse_listing(&body);
        candidates.retain(|c| self.policy.accepts(&c.name, c.seeders));
        candidates.sort_by(|a, b| b.seeders.cmp(&a.seeders));
        candidates.truncate(MAX_CANDIDATES_PER_SITE);
        Ok(candidates)
    }
}

/// Extract rows from a Pirate Bay results table. Each data row carries a
/// `detLink` anchor with the release name, an inline magnet anchor, and the
/// seeder count in the second-to-last cell. Header and malformed rows are
/// skipped.
fn parse_listing(html: &str) -> Vec<SearchCandidate> {
    let document = Html::parse_document(html);
    let row_sel = Selector::parse("table#searchResult tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();
    let name_sel = Selector::parse("a.detLink").unwrap();
    let magnet_sel = Selector::parse(r#"a[href^="magnet:"]"#).unwrap();

    let mut candidates = Vec::new();
    for row in document.select(&row_sel).take(MAX_EXAMINED_ROWS + 1) {
        let name = match row.select(&name_sel).next() {
            Some(a) => a.text().collect::<String>().trim().to_string(),
            None => continue, // header row
        };
        let magnet_uri = match row
            .select(&magnet_sel)
            .filter_map(|a| a.value().attr("href"))
            .next()
        {
            Some(href) => href.to_string(),
            None => continue,
        };

        let cells: Vec<_> = row.select(&cell_sel).collect();
        if cells.len() < 3 {
            continue;
        }
        let seeders = match cells[cells.len() - 2]
            .text()
            .collect::<String>()
            .trim()
            .parse::<u32>()
        {
            Ok(n) => n,
            Err(_) => continue,
        };
        if name.is_empty() {
            continue;
        }

        candidates.push(SearchCandidate {
            name,
            seeders,
            magnet_uri,
            source: SOURCE,
        });

        if candidates.len() >= MAX_EXAMINED_ROWS {
            break;
        }
    }
    candidates
}
