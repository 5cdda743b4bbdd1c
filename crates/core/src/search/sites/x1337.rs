//! 1337x adapter.
//!
//! HTML listing table; the magnet lives on a per-torrent detail page, so an
//! accepted listing costs a second round trip.

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use crate::proxy::HttpFactory;
use crate::search::quality::QualityPolicy;
use crate::search::types::{SearchCandidate, SiteAdapter, SiteError};

use super::{join_url, parse_detail_magnet, MAX_CANDIDATES_PER_SITE, MAX_EXAMINED_ROWS};

const SOURCE: &str = "1337x";
const DEFAULT_BASE_URL: &str = "https://1337x.to";

pub struct X1337Adapter {
    http: Arc<HttpFactory>,
    policy: Arc<QualityPolicy>,
    base_url: String,
}

impl X1337Adapter {
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
            debug!("1337x detail page {} returned {}", detail_url, response.status());
            return Ok(None);
        }
        let body = response.text().await?;
        Ok(parse_detail_magnet(&body))
    }
}

#[async_trait]
impl SiteAdapter for X1337Adapter {
    fn name(&self) -> &'static str {
        SOURCE
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchCandidate>, SiteError> {
        let url = format!(
            "{}/search/{}/1/",
            self.base_url,
            query.replace(' ', "+")
        );
        debug!("1337x search: {}", url);

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
                None => debug!("1337x: no magnet on detail page {}", detail_url),
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

/// Extract listing rows from a 1337x search results page. The name cell
/// holds an icon anchor followed by the torrent anchor, so the last anchor
/// wins. Malformed rows are skipped.
fn parse_listing(html: &str) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let row_sel = Selector::parse("table tbody tr").unwrap();
    let cell_sel = Selector::parse("td").unwrap();
    let anchor_sel = Selector::parse("a").unwrap();

    let mut listings = Vec::new();
    for row in document.select(&row_sel).take(MAX_EXAMINED_ROWS) {
        let cells: Vec<_> = row.select(&cell_sel).collect();
        if cells.len() < 2 {
            continue;
        }

        let anchor = match cells[0].select(&anchor_sel).last() {
            Some(a) => a,
            None => continue,
        };
        let name = anchor.text().collect::<String>().trim().to_string();
        let detail_path = match anchor.value().attr("href") {
            Some(href) if !href.is_empty() => href.to_string(),
            _ => continue,
        };
        let seeders = match cells[1].text().collect::<String>().trim().parse::<u32>() {
            Ok(n) => n,
            Err(_) => continue,
        };
        if name.is_empty() {
            continue;
        }

        listings.push(Listing {
            name,
            detail_path,
            seeders,
        });
    }
    listings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, href: &str, seeders: &str) -> String {
        format!(
            r#"<tr>
                 <td class="coll-1">
                   <a href="/sub/1/" class="icon"></a>
                   <a href="{}">{}</a>
                 </td>
                 <td class="coll-2">{}</td>
                 <td class="coll-3">12</td>
               </tr>"#,
            href, name, seeders
        )
    }

    fn page(rows: &[String]) -> String {
        format!(
            "<html><body><table class=\"table-list\"><tbody>{}</tbody></table></body></html>",
            rows.join("")
        )
    }

    #[test]
    fn test_parse_listing_extracts_rows() {
        let html = page(&[
            row("Movie.2010.1080p.BluRay", "/torrent/1/movie/", "120"),
            row("Movie.2010.720p.WEB", "/torrent/2/movie/", "44"),
        ]);

        let listings = parse_listing(&html);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].name, "Movie.2010.1080p.BluRay");
        assert_eq!(listings[0].detail_path, "/torrent/1/movie/");
        assert_eq!(listings[0].seeders, 120);
    }

    #[test]
    fn test_parse_listing_takes_last_anchor_in_name_cell() {
        let html = page(&[row("Real Name", "/torrent/9/real/", "7")]);
        let listings = parse_listing(&html);
        assert_eq!(listings[0].name, "Real Name");
        assert_eq!(listings[0].detail_path, "/torrent/9/real/");
    }

    #[test]
    fn test_parse_listing_skips_malformed_rows() {
        let html = page(&[
            "<tr><td>lonely cell</td></tr>".to_string(),
            row("Good.1080p", "/torrent/3/good/", "not-a-number"),
            row("Kept.1080p", "/torrent/4/kept/", "9"),
        ]);

        let listings = parse_listing(&html);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].name, "Kept.1080p");
    }

    #[test]
    fn test_parse_listing_examines_bounded_rows() {
        let rows: Vec<String> = (0..25)
            .map(|i| row(&format!("M{}.1080p", i), &format!("/torrent/{}/", i), "10"))
            .collect();
        let listings = parse_listing(&page(&rows));
        assert_eq!(listings.len(), MAX_EXAMINED_ROWS);
    }

    #[test]
    fn test_parse_listing_empty_page() {
        assert!(parse_listing("<html><body>blocked</body></html>").is_empty());
    }
}
