//! Configuration System
//!
//! Loads configuration from a TOML file with environment variable
//! overrides. Every section and field has a default, so an empty file or no
//! file at all yields a working setup.

use crate::analytics::AnomalyConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Demo snapshot configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_path")]
    pub path: PathBuf,

    #[serde(default = "default_demo_days")]
    pub demo_days: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_data_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("wellsync").join("demo_data.csv"))
        .unwrap_or_else(|| PathBuf::from("./data/demo_data.csv"))
}

fn default_demo_days() -> usize {
    crate::demo::DEFAULT_DEMO_DAYS
}

fn default_seed() -> u64 {
    crate::demo::DEFAULT_SEED
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            demo_days: default_demo_days(),
            seed: default_seed(),
        }
    }
}

/// Anomaly detector tuning
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_window")]
    pub window: usize,

    #[serde(default = "default_z_threshold")]
    pub z_threshold: f64,

    #[serde(default = "default_min_persist")]
    pub min_persist: usize,
}

fn default_window() -> usize {
    AnomalyConfig::default().window
}

fn default_z_threshold() -> f64 {
    AnomalyConfig::default().z_threshold
}

fn default_min_persist() -> usize {
    AnomalyConfig::default().min_persist
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            z_threshold: default_z_threshold(),
            min_persist: default_min_persist(),
        }
    }
}

impl AnalyticsConfig {
    pub fn anomaly(&self) -> AnomalyConfig {
        AnomalyConfig {
            window: self.window,
            z_threshold: self.z_threshold,
            min_persist: self.min_persist,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
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
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("wellsync").join("config.toml")),
            Some(PathBuf::from("/etc/wellsync/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("WELLSYNC_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("WELLSYNC_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        if let Some(path) = lookup("WELLSYNC_DATA_PATH") {
            self.data.path = PathBuf::from(path);
        }

        if let Some(level) = lookup("WELLSYNC_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("WELLSYNC_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# WellSync Configuration
#
# Environment variables override these settings:
# - WELLSYNC_API_HOST
# - WELLSYNC_API_PORT
# - WELLSYNC_DATA_PATH
# - WELLSYNC_LOG_LEVEL
# - WELLSYNC_LOG_FORMAT

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8000

# Allowed CORS origins
cors_origins = ["http://localhost:3000", "http://127.0.0.1:3000"]

[data]
# Demo snapshot the simulated providers are read from
# (defaults to the platform data directory)
# path = "./data/demo_data.csv"

# Days generated when the snapshot is first created
demo_days = 90

# Random seed for the demo generator
seed = 42

[analytics]
# Rolling baseline window (days)
window = 30

# Minimum |z| for a day to count as anomalous
z_threshold = 1.8

# Minimum consecutive anomalous days to report
min_persist = 2

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
