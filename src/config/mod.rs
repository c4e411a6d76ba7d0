//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::parse_duration;
use crate::storage::StorageConfig;

/// Environment variable prefix, e.g. `STRATASCRIBE__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "STRATASCRIBE";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to load config: {0}")]
    LoadError(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Reference dataset download and caching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Base URL the table files live under
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Age after which a cached table is re-fetched
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,

    /// Minimum time between remote update checks
    #[serde(default = "default_check_interval")]
    pub check_interval: String,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay: String,

    #[serde(default = "default_rate_limit_delay")]
    pub rate_limit_delay: String,

    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Responses below this size containing an HTML doctype are throttle pages
    #[serde(default = "default_min_file_size")]
    pub min_file_size: usize,
}

fn default_base_url() -> String {
    "https://wahapedia.ru/wh40k10ed/".to_string()
}

fn default_refresh_interval() -> String {
    "24h".to_string()
}

fn default_check_interval() -> String {
    "10m".to_string()
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> String {
    "3s".to_string()
}

fn default_rate_limit_delay() -> String {
    "5s".to_string()
}

fn default_timeout() -> String {
    "30s".to_string()
}

fn default_min_file_size() -> usize {
    2048
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            refresh_interval: default_refresh_interval(),
            check_interval: default_check_interval(),
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
            rate_limit_delay: default_rate_limit_delay(),
            timeout: default_timeout(),
            min_file_size: default_min_file_size(),
        }
    }
}

impl DatasetConfig {
    pub fn refresh_interval(&self) -> Duration {
        duration_or(&self.refresh_interval, 86_400)
    }

    pub fn check_interval(&self) -> Duration {
        duration_or(&self.check_interval, 600)
    }

    pub fn retry_delay(&self) -> Duration {
        duration_or(&self.retry_delay, 3)
    }

    pub fn rate_limit_delay(&self) -> Duration {
        duration_or(&self.rate_limit_delay, 5)
    }

    pub fn timeout(&self) -> Duration {
        duration_or(&self.timeout, 30)
    }
}

/// Uploaded roster retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Upload directory; relative paths are under `data_dir`
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    #[serde(default = "default_retention")]
    pub retention: String,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_retention() -> String {
    "24h".to_string()
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            retention: default_retention(),
        }
    }
}

impl UploadConfig {
    pub fn retention(&self) -> Duration {
        duration_or(&self.retention, 86_400)
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub dataset: DatasetConfig,

    #[serde(default)]
    pub uploads: UploadConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            dataset: DatasetConfig::default(),
            uploads: UploadConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an optional TOML file overlaid with `STRATASCRIBE__*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path.filter(|p| p.exists()) {
            builder = builder.add_source(
                ::config::File::from(path.to_path_buf()).format(::config::FileFormat::Toml),
            );
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Storage paths derived from `data_dir` and the upload settings.
    pub fn storage(&self) -> StorageConfig {
        let uploads_dir = if self.uploads.upload_dir.is_absolute() {
            self.uploads.upload_dir.clone()
        } else {
            self.data_dir.join(&self.uploads.upload_dir)
        };
        StorageConfig::new(self.data_dir.clone()).with_uploads_dir(uploads_dir)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset.max_retries == 0 {
            return Err(ConfigError::ValidationError(
                "Dataset max_retries must be greater than 0".to_string(),
            ));
        }

        let durations = [
            ("dataset.refresh_interval", &self.dataset.refresh_interval),
            ("dataset.check_interval", &self.dataset.check_interval),
            ("dataset.retry_delay", &self.dataset.retry_delay),
            ("dataset.rate_limit_delay", &self.dataset.rate_limit_delay),
            ("dataset.timeout", &self.dataset.timeout),
            ("uploads.retention", &self.uploads.retention),
        ];
        for (key, value) in durations {
            if parse_duration(value).is_none() {
                return Err(ConfigError::ValidationError(format!(
                    "{key} is not a valid duration: '{value}'"
                )));
            }
        }

        if url::Url::parse(&self.dataset.base_url).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "Dataset base_url is not a valid URL: '{}'",
                self.dataset.base_url
            )));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn duration_or(value: &str, fallback_secs: u64) -> Duration {
    parse_duration(value).unwrap_or(Duration::from_secs(fallback_secs))
}
