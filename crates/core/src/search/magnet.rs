//! Magnet URI helpers.
//!
//! The info hash is the canonical content identity: 40 hex characters,
//! normalized to lowercase wherever it is compared or stored.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static BTIH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"btih:([a-fA-F0-9]{40})").unwrap());

/// Trackers appended when building a magnet from a bare info hash.
pub const TRACKERS: [&str; 8] = [
    "udp://open.demonii.com:1337/announce",
    "udp://tracker.openbittorrent.com:80",
    "udp://tracker.coppersurfer.tk:6969",
    "udp://glotorrents.pw:6969/announce",
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://torrent.gresille.org:80/announce",
    "udp://p4p.arenabg.com:1337",
    "udp://tracker.leechers-paradise.org:6969",
];

/// Extract the BitTorrent info hash from a magnet URI, lowercased.
/// Returns None when the URI carries no well-formed btih parameter.
pub fn extract_info_hash(uri: &str) -> Option<String> {
    BTIH_RE
        .captures(uri)
        .map(|c| c[1].to_lowercase())
}

/// Build a magnet URI from a bare info hash and a display name.
pub fn from_info_hash(hash: &str, display_name: &str) -> String {
    let mut uri = format!(
        "magnet:?xt=urn:btih:{}&dn={}",
        hash.to_lowercase(),
        urlencoding::encode(display_name)
    );
    for tracker in TRACKERS {
        uri.push_str("&tr=");
        uri.push_str(&urlencoding::encode(tracker));
    }
    uri
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "0123456789abcdef0123456789abcdef01234567";

    #[test]
    fn test_extract_lowercase_hash() {
        let uri = format!("magnet:?xt=urn:btih:{}&dn=Some+Movie", HASH);
        assert_eq!(extract_info_hash(&uri).as_deref(), Some(HASH));
    }

    #[test]
    fn test_extract_is_case_insensitive() {
        let uri = format!("magnet:?xt=urn:btih:{}", HASH.to_uppercase());
        assert_eq!(extract_info_hash(&uri).as_deref(), Some(HASH));
    }

    #[test]
    fn test_extract_is_idempotent_on_extracted_hash() {
        let uri = format!("magnet:?xt=urn:btih:{}", HASH.to_uppercase());
        let first = extract_info_hash(&uri).unwrap();
        let rebuilt = from_info_hash(&first, "x");
        let second = extract_info_hash(&rebuilt).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_extract_rejects_short_hash() {
        assert!(extract_info_hash("magnet:?xt=urn:btih:abcdef").is_none());
    }

    #[test]
    fn test_extract_rejects_non_magnet() {
        assert!(extract_info_hash("https://example.com/torrent/123").is_none());
    }

    #[test]
    fn test_from_info_hash_includes_all_trackers() {
        let uri = from_info_hash(HASH, "Some Movie (2010)");
        assert!(uri.starts_with(&format!("magnet:?xt=urn:btih:{}", HASH)));
        assert_eq!(uri.matches("&tr=").count(), TRACKERS.len());
        assert!(uri.contains("Some%20Movie"));
    }

    #[test]
    fn test_from_info_hash_lowercases() {
        let uri = from_info_hash(&HASH.to_uppercase(), "x");
        assert_eq!(extract_info_hash(&uri).as_deref(), Some(HASH));
    }
}
