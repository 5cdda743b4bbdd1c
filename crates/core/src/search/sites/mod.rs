//! Site adapters, one module per supported source.

pub mod limetorrents;
pub mod piratebay;
pub mod x1337;
pub mod yts;

pub use limetorrents::LimeTorrentsAdapter;
pub use piratebay::PirateBayAdapter;
pub use x1337::X1337Adapter;
pub use yts::YtsAdapter;

use scraper::{Html, Selector};

/// Raw listing rows examined per site before filtering.
pub(crate) const MAX_EXAMINED_ROWS: usize = 10;

/// Candidates a single site contributes after filtering and ranking.
pub(crate) const MAX_CANDIDATES_PER_SITE: usize = 3;

/// Pull the first magnet link out of a torrent detail page.
pub(crate) fn parse_detail_magnet(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let magnet_sel = Selector::parse(r#"a[href^="magnet:"]"#).unwrap();

    document
        .select(&magnet_sel)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.to_string())
        .next()
}

/// Join a possibly relative href onto a site base URL.
pub(crate) fn join_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detail_magnet_finds_link() {
        let html = r#"
            <html><body>
              <a href="/downloads/other">other</a>
              <a href="magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567&dn=x">Magnet</a>
            </body></html>
        "#;
        let magnet = parse_detail_magnet(html).unwrap();
        assert!(magnet.starts_with("magnet:?xt=urn:btih:0123456789abcdef"));
    }

    #[test]
    fn test_parse_detail_magnet_missing() {
        assert!(parse_detail_magnet("<html><body>nothing here</body></html>").is_none());
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://example.org/", "/torrent/1"),
            "https://example.org/torrent/1"
        );
        assert_eq!(
            join_url("https://example.org", "https://cdn.example.org/t/1"),
            "https://cdn.example.org/t/1"
        );
    }
}
