//! Mock implementations for tests.
//!
//! These live in the library (not behind `cfg(test)`) so unit tests,
//! integration tests, and downstream consumers can wire them in place of
//! real backends.

mod mock_catalog;
mod mock_channel;
mod mock_debrid;
mod mock_library;
mod mock_site;

pub use mock_catalog::MockCatalogService;
pub use mock_channel::MockChannelService;
pub use mock_debrid::MockDebridClient;
pub use mock_library::MockLibraryService;
pub use mock_site::MockSiteAdapter;

use crate::debrid::ActiveTorrent;
use crate::search::SearchCandidate;

/// Active-set entry with reasonable defaults.
pub fn active_torrent(id: &str, name: &str, hash: &str) -> ActiveTorrent {
    ActiveTorrent {
        id: id.to_string(),
        name: name.to_string(),
        hash: hash.to_lowercase(),
        status: "downloading".to_string(),
        progress: 10.0,
        added_at: None,
    }
}

/// Candidate with a well-formed magnet built from the given hash.
pub fn search_candidate(name: &str, seeders: u32, hash: &str, source: &'static str) -> SearchCandidate {
    SearchCandidate {
        name: name.to_string(),
        seeders,
        magnet_uri: format!("magnet:?xt=urn:btih:{}&dn={}", hash, name.replace(' ', "+")),
        source,
    }
}
