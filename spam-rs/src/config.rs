//! Configuration for spam-rs
//!
//! Values come from an optional TOML file, then `SPAM_RS__<SECTION>__<KEY>`
//! environment variables. Every field has a default so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SpamError};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "SPAM_RS";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:8000")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

/// Locations of the frozen classifier/vectorizer pair
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_vectorizer_path")]
    pub vectorizer_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests allowed per client per window
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// How often stale client windows are evicted
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/model.json")
}

fn default_vectorizer_path() -> PathBuf {
    PathBuf::from("models/vectorizer.json")
}

fn default_true() -> bool {
    true
}

fn default_max_requests() -> u32 {
    50
}

fn default_window_seconds() -> u64 {
    60
}

fn default_cleanup_interval() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            vectorizer_path: default_vectorizer_path(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: default_max_requests(),
            window_seconds: default_window_seconds(),
            cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file with environment overrides.
    ///
    /// A missing `path` means defaults plus environment only.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(SpamError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| SpamError::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| SpamError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (no environment overrides)
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| SpamError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.server
            .listen_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|e| {
                SpamError::Config(format!(
                    "Invalid listen address '{}': {}",
                    self.server.listen_addr, e
                ))
            })?;

        if self.rate_limit.enabled {
            if self.rate_limit.max_requests == 0 {
                return Err(SpamError::Config(
                    "rate_limit.max_requests must be at least 1".to_string(),
                ));
            }
            if self.rate_limit.window_seconds == 0 {
                return Err(SpamError::Config(
                    "rate_limit.window_seconds must be at least 1".to_string(),
                ));
            }
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(SpamError::Config(format!(
                "Unknown logging format '{}' (expected 'pretty' or 'json')",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.listen_addr, "0.0.0.0:8000");
        assert!(config.rate_limit.enabled);
        assert_eq!(config.rate_limit.max_requests, 50);
        assert_eq!(config.rate_limit.window_seconds, 60);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[server]
listen_addr = "127.0.0.1:9000"

[rate_limit]
max_requests = 10
"#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window_seconds, 60);
        assert_eq!(config.model.model_path, PathBuf::from("models/model.json"));
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_rejects_bad_listen_addr() {
        let toml = r#"
[server]
listen_addr = "not-an-address"
"#;
        assert!(matches!(Config::from_toml(toml), Err(SpamError::Config(_))));
    }

    #[test]
    fn test_rejects_zero_window() {
        let toml = r#"
[rate_limit]
window_seconds = 0
"#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_zero_limit_allowed_when_disabled() {
        let toml = r#"
[rate_limit]
enabled = false
max_requests = 0
"#;
        assert!(Config::from_toml(toml).is_ok());
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        let toml = r#"
[logging]
format = "xml"
"#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spam.toml");
        std::fs::write(
            &path,
            "[model]\nmodel_path = \"/srv/model.json\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.model.model_path, PathBuf::from("/srv/model.json"));
        assert_eq!(
            config.model.vectorizer_path,
            PathBuf::from("models/vectorizer.json")
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/spam.toml")));
        assert!(matches!(result, Err(SpamError::Config(_))));
    }
}
