//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `HARVARD_LIBRARY_` (sections separated
//! by `__`, e.g. `HARVARD_LIBRARY_API__BASE_URL`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "https://api.lib.harvard.edu/v2"
//! timeout_seconds = 30
//! user_agent = "harvard-library-mcp/0.2.0"
//!
//! [rate_limits]
//! requests_per_second = 10.0
//! burst_size = 20
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "HARVARD_LIBRARY";

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "harvard-library-mcp.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream catalog API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Rate limiting settings
    #[serde(default)]
    pub rate_limits: RateLimitConfig,

    /// Bind address for the HTTP transports
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the catalog API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.lib.harvard.edu/v2".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained requests per second towards the upstream API
    #[serde(default = "default_rps")]
    pub requests_per_second: f64,

    /// Maximum burst of back-to-back requests
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rps(),
            burst_size: default_burst(),
        }
    }
}

fn default_rps() -> f64 {
    10.0
}

fn default_burst() -> u32 {
    20
}

/// HTTP bind configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Check the values that would otherwise fail later at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.api.base_url)
            .map_err(|e| ConfigError::Validation(format!("api.base_url: {}", e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "api.base_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "api.timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if !(self.rate_limits.requests_per_second > 0.0) {
            return Err(ConfigError::Validation(
                "rate_limits.requests_per_second must be greater than 0".to_string(),
            ));
        }
        if self.rate_limits.burst_size == 0 {
            return Err(ConfigError::Validation(
                "rate_limits.burst_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Render this configuration as a TOML document
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Write this configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Load configuration from defaults, an optional file and the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder =
        config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

/// Find a configuration file in the default locations
///
/// Looks in the working directory first, then in the platform config directory
/// (`~/.config/harvard-library-mcp/config.toml` on Linux).
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    default_config_path().filter(|p| p.is_file())
}

/// Platform-specific location of the user configuration file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(env!("CARGO_PKG_NAME")).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://api.lib.harvard.edu/v2");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.rate_limits.requests_per_second, 10.0);
        assert_eq!(config.rate_limits.burst_size, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(
            &path,
            r#"
[api]
base_url = "http://localhost:9999/v2"
timeout_seconds = 5

[rate_limits]
requests_per_second = 2.5
burst_size = 3

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:9999/v2");
        assert_eq!(config.api.timeout_seconds, 5);
        assert_eq!(config.rate_limits.requests_per_second, 2.5);
        assert_eq!(config.rate_limits.burst_size, 3);
        assert_eq!(config.logging.level, "debug");
        // untouched sections keep their defaults
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.rate_limits.burst_size = 7;
        config.save(&path).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.rate_limits.burst_size, 7);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.rate_limits.requests_per_second = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.rate_limits.burst_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.base_url = "ftp://example.org".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let path = PathBuf::from("/nonexistent/harvard-library-mcp.toml");
        assert!(load_config(Some(&path)).is_err());
    }
}
