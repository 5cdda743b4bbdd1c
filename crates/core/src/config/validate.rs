use super::{types::Config, ConfigError};

fn require_url(name: &str, url: &str) -> Result<(), ConfigError> {
    if url.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{} must be set",
            name
        )));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "{} must be an http(s) URL, got '{}'",
            name, url
        )));
    }
    Ok(())
}

/// Validate configuration before any batch work starts.
/// Checks:
/// - required credentials are non-empty
/// - service base URLs look like URLs
/// - worker and limit settings are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.catalog.api_key.is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog.api_key must be set".to_string(),
        ));
    }
    if config.library.api_key.is_empty() {
        return Err(ConfigError::ValidationError(
            "library.api_key must be set".to_string(),
        ));
    }
    if config.debrid.api_token.is_empty() {
        return Err(ConfigError::ValidationError(
            "debrid.api_token must be set".to_string(),
        ));
    }

    require_url("library.base_url", &config.library.base_url)?;
    require_url("channel.base_url", &config.channel.base_url)?;
    if let Some(url) = &config.catalog.base_url {
        require_url("catalog.base_url", url)?;
    }
    if let Some(url) = &config.debrid.base_url {
        require_url("debrid.base_url", url)?;
    }

    if config.batch.workers == 0 {
        return Err(ConfigError::ValidationError(
            "batch.workers cannot be 0".to_string(),
        ));
    }
    if config.batch.movie_limit == 0 {
        return Err(ConfigError::ValidationError(
            "batch.movie_limit cannot be 0".to_string(),
        ));
    }
    if config.search.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "search.concurrency cannot be 0".to_string(),
        ));
    }

    Ok(())
}
