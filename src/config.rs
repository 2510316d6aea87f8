//! Configuration management
//!
//! This module handles loading and managing configuration from:
//! - Command-line arguments
//! - Environment variables
//! - Configuration files (TOML)
//! - Defaults

use crate::data_source::blockbook::{DEFAULT_API_KEY_HEADER, DEFAULT_BASE_URL};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the provider API key
pub const API_KEY_ENV: &str = "PROVIDER_API_KEY";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub default: DefaultConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub mock: MockConfig,

    #[serde(default)]
    pub traversal: TraversalConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultConfig {
    #[serde(default = "default_source")]
    pub source: String,

    /// Depth used when none is given on the command line
    #[serde(default = "default_depth")]
    pub depth: u32,
}

/// Indexing service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key
    pub api_key: Option<String>,

    /// Base URL of the Blockbook-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Header the API key is sent in
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

/// Mock data source configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MockConfig {
    /// JSON fixture file
    pub fixtures: Option<PathBuf>,
}

/// Traversal limits
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TraversalConfig {
    /// Overall deadline for one traversal, in seconds (none by default)
    pub timeout_secs: Option<u64>,
}

/// Interactive display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// How long an error stays on screen before returning to the prompt
    #[serde(default = "default_error_display")]
    pub error_display_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_source() -> String {
    "blockbook".to_string()
}

fn default_depth() -> u32 {
    3
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key_header() -> String {
    DEFAULT_API_KEY_HEADER.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_error_display() -> u64 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            depth: default_depth(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            api_key_header: default_api_key_header(),
            timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            error_display_secs: default_error_display(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&contents).map_err(|e| Error::ConfigParse {
            file: path.clone(),
            message: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values no command can run with
    pub fn validate(&self) -> Result<()> {
        if self.default.depth == 0 {
            return Err(Error::Config(
                "default.depth must be at least 1, got 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. ./config.toml
    /// 2. ~/.wallet-flow-viz/config.toml
    /// 3. /etc/wallet-flow-viz/config.toml
    pub fn load() -> Result<Self> {
        let mut paths = vec![PathBuf::from("config.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".wallet-flow-viz").join("config.toml"));
        }
        paths.push(PathBuf::from("/etc/wallet-flow-viz/config.toml"));

        for path in paths {
            if path.exists() {
                tracing::info!("Loading config from {:?}", path);
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Get the provider API key from environment or config
    ///
    /// Priority: environment variable > config file
    pub fn provider_api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.trim().is_empty()
        {
            return Ok(key);
        }

        self.provider
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::MissingConfig(format!(
                    "Provider API key not found. Set {} environment variable or configure [provider].api_key in config file",
                    API_KEY_ENV
                ))
            })
    }

    /// Get the mock fixture file
    pub fn mock_fixture_path(&self) -> Result<PathBuf> {
        self.mock.fixtures.clone().ok_or_else(|| {
            Error::MissingConfig(
                "Mock fixtures not configured. Set [mock].fixtures in config file or pass --fixtures"
                    .to_string(),
            )
        })
    }

    /// Overall traversal deadline, if any
    pub fn traversal_timeout(&self) -> Option<Duration> {
        self.traversal.timeout_secs.map(Duration::from_secs)
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_secs(self.display.error_display_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default.source, "blockbook");
        assert_eq!(config.default.depth, 3);
        assert_eq!(config.provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.provider.api_key_header, "api-key");
        assert_eq!(config.display.error_display_secs, 3);
        assert_eq!(config.logging.level, "info");
        assert!(config.traversal_timeout().is_none());
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
[default]
source = "mock"
depth = 4

[provider]
api_key = "test_key"
base_url = "https://blockbook.example/api/v2"
timeout_secs = 5

[mock]
fixtures = "fixtures/demo.json"

[traversal]
timeout_secs = 120

[logging]
level = "debug"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.default.source, "mock");
        assert_eq!(config.default.depth, 4);
        assert_eq!(config.provider.api_key, Some("test_key".to_string()));
        assert_eq!(config.provider.api_key_header, "api-key");
        assert_eq!(config.provider.timeout(), Duration::from_secs(5));
        assert_eq!(
            config.mock_fixture_path().unwrap(),
            PathBuf::from("fixtures/demo.json")
        );
        assert_eq!(config.traversal_timeout(), Some(Duration::from_secs(120)));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_from_file_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[default\nsource = 1").unwrap();

        match Config::from_file(file.path()) {
            Err(Error::ConfigParse { file: path, .. }) => assert_eq!(path, file.path()),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_from_file_rejects_zero_depth() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[default]\ndepth = 0").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("depth")));
    }

    #[test]
    fn test_missing_mock_fixtures() {
        let err = Config::default().mock_fixture_path().unwrap_err();
        assert!(matches!(err, Error::MissingConfig(_)));
    }
}
