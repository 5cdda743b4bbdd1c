use serde::{Deserialize, Serialize};

use crate::catalog::TmdbConfig;
use crate::channel::TunarrConfig;
use crate::debrid::RealDebridConfig;
use crate::library::JellyfinConfig;
use crate::search::QualityPolicy;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub catalog: TmdbConfig,
    pub library: JellyfinConfig,
    pub debrid: RealDebridConfig,
    pub channel: TunarrConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Discovery configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Shared release quality policy.
    #[serde(default)]
    pub quality: QualityPolicy,
    /// Per-site enable switches.
    #[serde(default = "default_true")]
    pub enable_x1337: bool,
    #[serde(default = "default_true")]
    pub enable_yts: bool,
    #[serde(default = "default_true")]
    pub enable_piratebay: bool,
    #[serde(default = "default_true")]
    pub enable_limetorrents: bool,
    /// Base URL overrides, mainly for mirrors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x1337_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yts_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piratebay_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limetorrents_url: Option<String>,
    /// Sites queried concurrently per search.
    #[serde(default = "default_site_concurrency")]
    pub concurrency: usize,
    /// Per-request timeout in seconds for site traffic.
    #[serde(default = "default_site_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            quality: QualityPolicy::default(),
            enable_x1337: true,
            enable_yts: true,
            enable_piratebay: true,
            enable_limetorrents: true,
            x1337_url: None,
            yts_url: None,
            piratebay_url: None,
            limetorrents_url: None,
            concurrency: default_site_concurrency(),
            timeout_secs: default_site_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_site_concurrency() -> usize {
    4
}

fn default_site_timeout() -> u64 {
    10
}

/// Proxy pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Route site traffic through rotating proxies.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Provider returning one host:port per line.
    #[serde(default = "default_provider_url")]
    pub provider_url: String,
    /// Endpoint used to probe proxy liveness.
    #[serde(default = "default_echo_url")]
    pub echo_url: String,
    /// Pool refresh interval in seconds.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    /// Fixed pool; when non-empty, the provider is never queried.
    #[serde(default)]
    pub static_list: Vec<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider_url: default_provider_url(),
            echo_url: default_echo_url(),
            refresh_secs: default_refresh_secs(),
            static_list: Vec::new(),
        }
    }
}

fn default_provider_url() -> String {
    "https://api.proxyscrape.com/v2/?request=getproxies&protocol=http&timeout=10000&country=US&ssl=all&anonymity=all"
        .to_string()
}

fn default_echo_url() -> String {
    "https://httpbin.org/ip".to_string()
}

fn default_refresh_secs() -> u64 {
    1800
}

/// Batch orchestration configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Concurrent per-movie workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Maximum movies processed per run.
    #[serde(default = "default_movie_limit")]
    pub movie_limit: usize,
    /// How many active torrents to pull for the dedup check.
    #[serde(default = "default_active_limit")]
    pub active_limit: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            movie_limit: default_movie_limit(),
            active_limit: default_active_limit(),
        }
    }
}

fn default_workers() -> usize {
    10
}

fn default_movie_limit() -> usize {
    40
}

fn default_active_limit() -> u32 {
    100
}

/// Sanitized config for display and logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub catalog: SanitizedServiceConfig,
    pub library: SanitizedServiceConfig,
    pub debrid: SanitizedServiceConfig,
    pub channel: SanitizedServiceConfig,
    pub search: SearchConfig,
    pub proxy: ProxyConfig,
    pub batch: BatchConfig,
}

/// One external service with its secret reduced to a presence flag.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedServiceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub credential_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            catalog: SanitizedServiceConfig {
                base_url: config.catalog.base_url.clone(),
                credential_configured: !config.catalog.api_key.is_empty(),
            },
            library: SanitizedServiceConfig {
                base_url: Some(config.library.base_url.clone()),
                credential_configured: !config.library.api_key.is_empty(),
            },
            debrid: SanitizedServiceConfig {
                base_url: config.debrid.base_url.clone(),
                credential_configured: !config.debrid.api_token.is_empty(),
            },
            channel: SanitizedServiceConfig {
                base_url: Some(config.channel.base_url.clone()),
                credential_configured: true,
            },
            search: config.search.clone(),
            proxy: config.proxy.clone(),
            batch: config.batch.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    #[test]
    fn test_sanitized_config_redacts_secrets() {
        let config = load_config_from_str(
            r#"
[catalog]
api_key = "tmdb-secret"

[library]
base_url = "http://localhost:8096"
api_key = "jf-secret"

[debrid]
api_token = "rd-secret"

[channel]
base_url = "http://localhost:8000"
"#,
        )
        .unwrap();

        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();

        assert!(!json.contains("tmdb-secret"));
        assert!(!json.contains("jf-secret"));
        assert!(!json.contains("rd-secret"));
        assert!(sanitized.catalog.credential_configured);
        assert!(sanitized.debrid.credential_configured);
    }

    #[test]
    fn test_defaults() {
        let search = SearchConfig::default();
        assert!(search.enable_x1337);
        assert_eq!(search.concurrency, 4);

        let batch = BatchConfig::default();
        assert_eq!(batch.workers, 10);
        assert_eq!(batch.movie_limit, 40);

        let proxy = ProxyConfig::default();
        assert!(proxy.enabled);
        assert_eq!(proxy.refresh_secs, 1800);
    }
}
