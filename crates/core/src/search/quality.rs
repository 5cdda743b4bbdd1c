//! Shared release quality policy.
//!
//! Every site adapter filters through the same policy instance, so accepting
//! a new quality tier or banning a new junk marker is a single change.

use serde::{Deserialize, Serialize};

fn default_quality() -> String {
    "1080p".to_string()
}

fn default_allow_bluray() -> bool {
    true
}

fn default_min_seeders() -> u32 {
    5
}

fn default_banned_terms() -> Vec<String> {
    ["sample", "cam", "hdts", "telesync"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Decides which listed releases are worth carrying forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityPolicy {
    /// Quality tag that must appear in the release name.
    #[serde(default = "default_quality")]
    pub quality: String,
    /// Also accept releases tagged "bluray" without the quality tag.
    #[serde(default = "default_allow_bluray")]
    pub allow_bluray: bool,
    /// Minimum seeders for a listing to be considered at all.
    #[serde(default = "default_min_seeders")]
    pub min_seeders: u32,
    /// Substrings that disqualify a release outright.
    #[serde(default = "default_banned_terms")]
    pub banned_terms: Vec<String>,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            allow_bluray: default_allow_bluray(),
            min_seeders: default_min_seeders(),
            banned_terms: default_banned_terms(),
        }
    }
}

impl QualityPolicy {
    /// Check the release name alone (used where seeders are not yet known).
    pub fn accepts_name(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();

        if self.banned_terms.iter().any(|t| lowered.contains(t)) {
            return false;
        }

        lowered.contains(&self.quality) || (self.allow_bluray && lowered.contains("bluray"))
    }

    /// Full listing check: name plus reported seeders.
    pub fn accepts(&self, name: &str, seeders: u32) -> bool {
        seeders >= self.min_seeders && self.accepts_name(name)
    }
}
