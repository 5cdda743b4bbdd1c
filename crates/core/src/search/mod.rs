//! Torrent discovery: site adapters, quality policy, aggregation.

pub mod aggregator;
pub mod magnet;
pub mod quality;
pub mod sites;
pub mod types;

pub use aggregator::SearchAggregator;
pub use quality::QualityPolicy;
pub use types::{AggregateResult, SearchCandidate, SiteAdapter, SiteError};

/// Fold a common accented Latin character to its ASCII base.
fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        'ß' => 's',
        other => other,
    }
}

/// Normalize a raw title into a site-safe query: fold diacritics, drop
/// everything outside alphanumerics and spaces, collapse runs of
/// whitespace. Adapters apply their own word delimiter when building URLs.
pub fn normalize_query(raw: &str) -> String {
    let filtered: String = raw
        .chars()
        .map(fold_diacritic)
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain_title() {
        assert_eq!(normalize_query("The Matrix"), "The Matrix");
    }

    #[test]
    fn test_normalize_folds_diacritics() {
        assert_eq!(normalize_query("Amélie"), "Amelie");
        assert_eq!(normalize_query("Léon: The Professional"), "Leon The Professional");
    }

    #[test]
    fn test_normalize_drops_punctuation_without_spacing() {
        assert_eq!(normalize_query("Spider-Man: Homecoming"), "SpiderMan Homecoming");
        assert_eq!(normalize_query("What's Up, Doc?"), "Whats Up Doc");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_query("  The   Matrix  "), "The Matrix");
    }

    #[test]
    fn test_normalize_keeps_digits() {
        assert_eq!(normalize_query("Blade Runner 2049"), "Blade Runner 2049");
    }
}
