use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides
/// (`PROJEKTOR_CATALOG__API_KEY` and friends).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("PROJEKTOR_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[catalog]
api_key = "tmdb-key"

[library]
base_url = "http://localhost:8096"
api_key = "jf-key"

[debrid]
api_token = "rd-token"

[channel]
base_url = "http://localhost:8000"
"#;

    #[test]
    fn test_load_config_from_str_minimal() {
        let config = load_config_from_str(MINIMAL).unwrap();
        assert_eq!(config.catalog.api_key, "tmdb-key");
        assert_eq!(config.batch.workers, 10);
        assert!(config.search.enable_yts);
    }

    #[test]
    fn test_load_config_from_str_overrides() {
        let toml = format!(
            "{}\n[batch]\nworkers = 2\n\n[search]\nenable_piratebay = false\n",
            MINIMAL
        );
        let config = load_config_from_str(&toml).unwrap();
        assert_eq!(config.batch.workers, 2);
        assert!(!config.search.enable_piratebay);
        assert!(config.search.enable_x1337);
    }

    #[test]
    fn test_load_config_from_str_missing_section() {
        let result = load_config_from_str("[catalog]\napi_key = \"k\"\n");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", MINIMAL).unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.library.base_url, "http://localhost:8096");
        assert_eq!(config.proxy.refresh_secs, 1800);
    }
}
