use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use marketlist_core::sync::DEFAULT_MAX_IN_FLIGHT;

/// Default HTTP request timeout for sync, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

fn default_max_in_flight() -> usize {
    DEFAULT_MAX_IN_FLIGHT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Server URL (e.g., "http://localhost:8080")
    pub server_url: Option<String>,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Concurrent requests per sync phase
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            api_key: None,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl SyncConfig {
    /// Returns true if sync is configured (has both server_url and api_key)
    pub fn is_configured(&self) -> bool {
        self.server_url.is_some() && self.api_key.is_some()
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding products.json
    pub data_dir: ConfigValue<PathBuf>,
    /// User whose remote collection is synced; asked from the server if unset
    pub user_id: ConfigValue<Option<String>>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Sync configuration
    pub sync: SyncConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    user_id: Option<String>,
    sync: Option<SyncConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut user_id = ConfigValue::new(None, ConfigSource::Default);
        let mut config_file = None;
        let mut sync = SyncConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(user) = file_config.user_id {
                user_id = ConfigValue::new(Some(user), ConfigSource::File);
            }
            if let Some(sync_config) = file_config.sync {
                sync = sync_config;
            }
        }

        if let Ok(dir) = std::env::var("MARKETLIST_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(user) = std::env::var("MARKETLIST_USER_ID") {
            user_id = ConfigValue::new(Some(user), ConfigSource::Environment);
        }
        if let Ok(url) = std::env::var("MARKETLIST_SYNC_URL") {
            sync.server_url = Some(url);
        }
        if let Ok(key) = std::env::var("MARKETLIST_SYNC_API_KEY") {
            sync.api_key = Some(key);
        }

        Ok(Self {
            data_dir,
            user_id,
            config_file,
            sync,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/marketlist/
    /// - macOS: ~/Library/Application Support/marketlist/
    /// - Windows: %APPDATA%/marketlist/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("marketlist")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/marketlist/
    /// - macOS: ~/Library/Application Support/marketlist/
    /// - Windows: %APPDATA%/marketlist/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("marketlist")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ReadError(_, e) => Some(e),
            ConfigError::ParseError(_, e) => Some(e),
        }
    }
}
