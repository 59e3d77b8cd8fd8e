//! Configuration loading and resolution
//!
//! Every setting is resolved once at startup and threaded into the pipeline
//! and its collaborators as an explicit [`Config`] value. Resolution priority:
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`CINECHECK_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Environment variable carrying the metadata-service API key
pub const API_KEY_ENV: &str = "CINECHECK_API_KEY";

/// Default metadata-service base URL (TMDB v3 API shape)
pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Default worker pool size for concurrent metadata lookups
pub const DEFAULT_WORKERS: usize = 4;

/// Default per-request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default attempt cap for transient-failure retries
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// On-disk TOML configuration (all fields optional)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub language: Option<String>,
    pub workers: Option<usize>,
    pub request_timeout_ms: Option<u64>,
    pub retry_attempts: Option<u32>,
}

/// Command-line overrides passed into resolution by the binary
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub language: Option<String>,
    pub workers: Option<usize>,
    pub request_timeout_ms: Option<u64>,
}

/// Fully-resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub language: Option<String>,
    pub workers: usize,
    pub request_timeout: Duration,
    pub retry_attempts: u32,
}

impl Config {
    /// Resolve runtime configuration from overrides + TOML + environment
    pub fn resolve(overrides: ConfigOverrides, toml_config: &TomlConfig) -> Result<Self> {
        let api_key = resolve_api_key(overrides.api_key.as_deref(), toml_config)?;

        let base_url = overrides
            .base_url
            .or_else(|| toml_config.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let language = overrides.language.or_else(|| toml_config.language.clone());

        let workers = overrides
            .workers
            .or(toml_config.workers)
            .unwrap_or(DEFAULT_WORKERS)
            .max(1);

        let timeout_ms = overrides
            .request_timeout_ms
            .or(toml_config.request_timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let retry_attempts = toml_config
            .retry_attempts
            .unwrap_or(DEFAULT_RETRY_ATTEMPTS)
            .max(1);

        Ok(Self {
            api_key,
            base_url,
            language,
            workers,
            request_timeout: Duration::from_millis(timeout_ms),
            retry_attempts,
        })
    }
}

/// Resolve metadata-service API key with CLI → ENV → TOML priority
pub fn resolve_api_key(cli_key: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    let env_key = std::env::var(API_KEY_ENV).ok();
    let toml_key = toml_config.api_key.as_deref();

    let mut sources = Vec::new();
    if cli_key.map(is_valid_key).unwrap_or(false) {
        sources.push("command line");
    }
    if env_key.as_deref().map(is_valid_key).unwrap_or(false) {
        sources.push("environment");
    }
    if toml_key.map(is_valid_key).unwrap_or(false) {
        sources.push("TOML");
    }

    // Warn if multiple sources (potential misconfiguration)
    if sources.len() > 1 {
        warn!(
            "API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = cli_key {
        if is_valid_key(key) {
            return Ok(key.to_string());
        }
    }

    if let Some(key) = env_key {
        if is_valid_key(&key) {
            return Ok(key);
        }
    }

    if let Some(key) = toml_key {
        if is_valid_key(key) {
            return Ok(key.to_string());
        }
    }

    Err(Error::Config(format!(
        "API key not configured. Provide it using one of:\n\
         1. Command line: --api-key your-key-here\n\
         2. Environment: {}=your-key-here\n\
         3. TOML config: api_key = \"your-key\" in {}",
        API_KEY_ENV,
        default_config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "~/.config/cinecheck/config.toml".to_string()),
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cinecheck").join("config.toml"))
}

/// Load TOML configuration
///
/// An explicitly-given path must exist and parse. The default path is
/// optional: missing file yields compiled defaults.
pub fn load_toml_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let (path, required) = match explicit_path {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return Ok(TomlConfig::default()),
        },
    };

    if !path.exists() {
        if required {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc123"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   "));
    }

    #[test]
    #[serial]
    fn test_resolve_api_key_priority() {
        std::env::set_var(API_KEY_ENV, "env-key");
        let toml_config = TomlConfig {
            api_key: Some("toml-key".to_string()),
            ..Default::default()
        };

        // CLI wins over everything
        assert_eq!(
            resolve_api_key(Some("cli-key"), &toml_config).unwrap(),
            "cli-key"
        );

        // ENV wins over TOML
        assert_eq!(resolve_api_key(None, &toml_config).unwrap(), "env-key");

        // TOML is the last resort
        std::env::remove_var(API_KEY_ENV);
        assert_eq!(resolve_api_key(None, &toml_config).unwrap(), "toml-key");
    }

    #[test]
    #[serial]
    fn test_resolve_api_key_missing() {
        std::env::remove_var(API_KEY_ENV);
        let result = resolve_api_key(None, &TomlConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    #[serial]
    fn test_blank_cli_key_falls_through() {
        std::env::remove_var(API_KEY_ENV);
        let toml_config = TomlConfig {
            api_key: Some("toml-key".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_api_key(Some("  "), &toml_config).unwrap(), "toml-key");
    }

    #[test]
    fn test_load_toml_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_key = \"abc\"\nworkers = 8\nrequest_timeout_ms = 2500"
        )
        .unwrap();

        let config = load_toml_config(Some(file.path())).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("abc"));
        assert_eq!(config.workers, Some(8));
        assert_eq!(config.request_timeout_ms, Some(2500));
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_load_toml_config_missing_explicit_path() {
        let result = load_toml_config(Some(Path::new("/nonexistent/cinecheck.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    #[serial]
    fn test_config_resolve_defaults() {
        std::env::remove_var(API_KEY_ENV);
        let overrides = ConfigOverrides {
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        let config = Config::resolve(overrides, &TomlConfig::default()).unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.request_timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(config.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
        assert!(config.language.is_none());
    }

    #[test]
    #[serial]
    fn test_config_resolve_overrides_beat_toml() {
        std::env::remove_var(API_KEY_ENV);
        let toml_config = TomlConfig {
            api_key: Some("toml-key".to_string()),
            workers: Some(2),
            language: Some("en-US".to_string()),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            workers: Some(6),
            ..Default::default()
        };
        let config = Config::resolve(overrides, &toml_config).unwrap();

        assert_eq!(config.api_key, "toml-key");
        assert_eq!(config.workers, 6);
        assert_eq!(config.language.as_deref(), Some("en-US"));
    }
}
