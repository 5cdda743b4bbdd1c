//! Public library types and title matching.

use serde::{Deserialize, Serialize};

/// An item (movie or collection) in the media library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryItem {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
}

/// How titles are compared against library item names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-insensitive exact name match.
    #[default]
    Exact,
    /// Normalized substring match, tolerant of retitled editions like
    /// "Movie (2009) [Remastered]".
    Fuzzy,
}

/// Lowercase and strip everything but alphanumerics, for fuzzy comparison.
fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

impl MatchMode {
    /// Whether `item_name` counts as the same title as `wanted`.
    pub fn matches(&self, wanted: &str, item_name: &str) -> bool {
        match self {
            MatchMode::Exact => wanted.eq_ignore_ascii_case(item_name),
            MatchMode::Fuzzy => {
                let wanted = normalize_title(wanted);
                !wanted.is_empty() && normalize_title(item_name).contains(&wanted)
            }
        }
    }
}

/// Every item after the first occurrence of each (case-insensitive) name.
pub fn duplicate_items(items: &[LibraryItem]) -> Vec<LibraryItem> {
    let mut seen = std::collections::HashSet::new();
    items
        .iter()
        .filter(|item| !seen.insert(item.name.to_lowercase()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, name: &str) -> LibraryItem {
        LibraryItem {
            id: id.to_string(),
            name: name.to_string(),
            year: None,
        }
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        assert!(MatchMode::Exact.matches("The Matrix", "the matrix"));
        assert!(!MatchMode::Exact.matches("The Matrix", "The Matrix Reloaded"));
    }

    #[test]
    fn test_fuzzy_match_tolerates_decoration() {
        assert!(MatchMode::Fuzzy.matches("The Matrix", "The Matrix (1999) [Remastered]"));
        assert!(MatchMode::Fuzzy.matches("Amelie", "Amélie".replace('é', "e").as_str()));
        assert!(!MatchMode::Fuzzy.matches("The Matrix", "Matrix"));
    }

    #[test]
    fn test_fuzzy_empty_query_never_matches() {
        assert!(!MatchMode::Fuzzy.matches("???", "Anything"));
    }

    #[test]
    fn test_match_mode_serde_names() {
        assert_eq!(serde_json::to_string(&MatchMode::Exact).unwrap(), "\"exact\"");
        assert_eq!(serde_json::to_string(&MatchMode::Fuzzy).unwrap(), "\"fuzzy\"");
    }

    #[test]
    fn test_duplicate_items() {
        let items = vec![
            item("1", "The Matrix"),
            item("2", "the matrix"),
            item("3", "Heat"),
            item("4", "The Matrix"),
        ];
        let dupes = duplicate_items(&items);
        let ids: Vec<&str> = dupes.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4"]);
    }
}
