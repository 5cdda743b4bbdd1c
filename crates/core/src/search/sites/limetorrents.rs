//! LimeTorrents adapter.
//!
//! HTML listing; like 1337x, magnets are resolved from each torrent's
//! detail page.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use crate::proxy::HttpFactory;
use crate::search::quality::QualityPolicy;
use crate::search::types::{SearchCandidate, SiteAdapter, SiteError};

use super::{join_url, parse_detail_magnet, MAX_CANDIDATES_PER_SITE, MAX_EXAMINED_ROWS};

const SOURCE: &str = "limetorrents";
const DEFAULT_BASE_URL: &str = "https://limetorrent.net";

pub struct LimeTorrentsAdapter {
    http: Arc<HttpFactory>,
    policy: Arc<QualityPolicy>,
    base_url: String,
}

impl LimeTorrentsAdapter {
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

    async fn fetch_magnet(
        &self,
        client: &reqwest::Client,
        detail_url: &str,
    ) -> Result<Option<String>, SiteError> {
        let response = client.get(detail_url).send().await?;
        if !response.status().is_success() {
            debug!(
                "limetorrents detail page {} returned {}",
                detail_url,
                response.status()
            );
            return Ok(None);
        }
        let body = response.text().await?;
        Ok(parse_detail_magnet(&body))
    }
}

#[async_trait]
impl SiteAdapter for LimeTorrentsAdapter {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, SiteError> {
        let url = format!("{}/search.php?q={}", self.base_url, query.replace(' ', "+"));
        debug!("limetorrents search: {}", url);

        let client = self.http.client().await.map_err(SiteError::from)?;
        let response = client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SiteError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        let mut listings = parse_listing(&body);
        listings.retain(|l| self.policy.accepts(&l.name, l.seeders));
        listings.sort_by(|a, b| b.seeders.cmp(&a.seeders));
        listings.truncate(MAX_CANDIDATES_PER_SITE);

        let mut candidates = Vec::with_capacity(listings.len());
        for listing in listings {
            let detail_url = join_url(&self.base_url, &listing.detail_path);
            match self.fetch_magnet(&client, &detail_url).await? {
                Some(magnet_uri) => candidates.push(SearchCandidate {
                    name: listing.name,
                    seeders: listing.seeders,
                    magnet_uri,
                    source: SOURCE,
                }),
                None => debug!("limetorrents: no magnet on detail page {}", detail_url),
            }
        }

        Ok(candidates)
    }
}

#[derive(Debug, PartialEq)]
struct Listing {
    name: String,
    detail_path: String,
    seeders: u32,
}

/// Extract rows from a LimeTorrents results table. The name cell is a
/// `div.tt-name` holding an itorrents icon anchor first and the detail-page
/// anchor second; the seeder count sits in a `tdseed` cell.
fn parse_listing(html: &str) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let row_sel = Selector::parse("table.table2 tr").unwrap();
    let name_sel = Selector::parse("div.tt-name a").unwrap();
    let seed_sel = Selector::parse("td.tdseed").unwrap();

    let mut listings = Vec::new();
    for row in document.select(&row_sel).take(MAX_EXAMINED_ROWS + 1) {
        let anchor = match row
            .select(&name_sel)
            .find(|a| {
                a.value()
                    .attr("href")
                    .map(|h| !h.contains("itorrents"))
                    .unwrap_or(false)
            }) {
            Some(a) => a,
            None => continue, // header row
        };
        let name = anchor.text().collect::<String>().trim().to_string();
        let detail_path = match anchor.value().attr("href") {
            Some(href) if !href.is_empty() => href.to_string(),
            _ => continue,
        };
        let seeders = match row.select(&seed_sel).next() {
            Some(cell) => {
                let text = cell.text().collect::<String>();
                match text.trim().replace(',', "").parse::<u32>() {
                    Ok(n) => n,
                    Err(_) => continue,
                }
            }
            None => continue,
        };
        if name.is_empty() {
            continue;
        }

        listings.push(Listing {
            name,
            detail_path,
            seeders,
        });

        if listings.len() >= MAX_EXAMINED_ROWS {
            break;
        }
    }
    listings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, href: &str, seeders: &str) -> String {
        format!(
            r#"<tr>
                 <td>
                   <div class="tt-name">
                     <a href="http://itorrents.org/torrent/ABC.torrent">dl</a>
                     <a href="{}">{}</a>
                   </div>
                 </td>
                 <td>2.1 GB</td>
                 <td class="tdseed">{}</td>
                 <td class="tdleech">4</td>
               </tr>"#,
            href, name, seeders
        )
    }

    fn page(rows: &[String]) -> String {
        format!(
            r#"<html><body><table class="table2">
               <tr><th>Torrent Name</th><th>Size</th><th>Seed</th><th>Leech</th></tr>
               {}</table></body></html>"#,
            rows.join("")
        )
    }

    #[test]
    fn test_parse_listing_extracts_rows() {
        let html = page(&[row(
            "Movie.2010.1080p.BluRay",
            "/Movie-2010-1080p-torrent-12345.html",
            "63",
        )]);

        let listings = parse_listing(&html);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Movie.2010.1080p.BluRay");
        assert_eq!(listings[0].detail_path, "/Movie-2010-1080p-torrent-12345.html");
        assert_eq!(listings[0].seeders, 63);
    }

    #[test]
    fn test_parse_listing_skips_itorrents_anchor() {
        let html = page(&[row("Named.1080p", "/Named-torrent-1.html", "8")]);
        let listings = parse_listing(&html);
        assert_eq!(listings[0].detail_path, "/Named-torrent-1.html");
    }

    #[test]
    fn test_parse_listing_parses_comma_separated_seeders() {
        let html = page(&[row("Big.1080p", "/Big-torrent-2.html", "1,204")]);
        assert_eq!(parse_listing(&html)[0].seeders, 1204);
    }

    #[test]
    fn test_parse_listing_skips_header_and_malformed_rows() {
        let html = page(&[
            "<tr><td>no name cell</td><td class=\"tdseed\">5</td></tr>".to_string(),
            row("Kept.1080p", "/Kept-torrent-3.html", "5"),
        ]);
        let listings = parse_listing(&html);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Kept.1080p");
    }

    #[test]
    fn test_parse_listing_empty_page() {
        assert!(parse_listing("<html><body></body></html>").is_empty());
    }
}
