//! Outbound HTTP plumbing: proxy pool rotation and client construction.

mod rotator;

pub use rotator::{ProxyRotator, RotatorError};

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

/// Browser user agent sent on scrape requests. Several of the sites serve
/// different markup (or a block page) to obvious bot agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Builds per-request HTTP clients, routing through the proxy rotator when
/// one is configured.
#[derive(Clone)]
pub struct HttpFactory {
    rotator: Option<Arc<ProxyRotator>>,
    timeout: Duration,
}

impl HttpFactory {
    /// Factory that always connects directly.
    pub fn direct(timeout: Duration) -> Self {
        Self {
            rotator: None,
            timeout,
        }
    }

    /// Factory drawing proxies from a shared rotator.
    pub fn with_rotator(rotator: Arc<ProxyRotator>, timeout: Duration) -> Self {
        Self {
            rotator: Some(rotator),
            timeout,
        }
    }

    /// Build a client for one request. An empty or exhausted pool degrades
    /// to a direct connection rather than failing the request.
    pub async fn client(&self) -> Result<Client, reqwest::Error> {
        let mut builder = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(self.timeout);

        if let Some(rotator) = &self.rotator {
            if let Some(endpoint) = rotator.get_proxy().await {
                builder = builder.proxy(reqwest::Proxy::all(&endpoint)?);
            }
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_direct_factory_builds_client() {
        let factory = HttpFactory::direct(Duration::from_secs(5));
        assert!(factory.client().await.is_ok());
    }
}
