//! Application configuration
//!
//! Split into focused sub-modules:
//! - `database`: SQLite database settings
//! - `refresh`: freshness window and batch locations
//!
//! Sources are layered: built-in defaults, then `config.toml` (or an explicit
//! file), then `WEATHER_REFRESH_*` environment variables. Nested keys use a
//! double underscore, e.g. `WEATHER_REFRESH_DATABASE__PATH=/var/lib/weather.db`.

mod database;
mod refresh;

use std::{fmt, path::Path};

use application::ApplicationError;
use config::{Config, ConfigBuilder, ConfigError, builder::DefaultState};
use domain::LocationName;
use integration_weather::WeatherApiConfig;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;

pub use database::DatabaseConfig;
pub use refresh::{BatchConfig, FreshnessConfig};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "WEATHER_REFRESH";

pub(crate) const fn default_true() -> bool {
    true
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid log format: {s}. Use 'text' or 'json'")),
        }
    }
}

fn default_store_retry() -> RetryConfig {
    RetryConfig::new(3, 1000)
}

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote weather API client
    #[serde(default)]
    pub weather_api: WeatherApiConfig,

    /// Retry policy for weather API calls
    #[serde(default)]
    pub api_retry: RetryConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Retry policy for database reads and writes
    #[serde(default = "default_store_retry")]
    pub store_retry: RetryConfig,

    /// Freshness window
    #[serde(default)]
    pub freshness: FreshnessConfig,

    /// Batch run locations
    #[serde(default)]
    pub batch: BatchConfig,

    /// Log output format
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            weather_api: WeatherApiConfig::default(),
            api_retry: RetryConfig::default(),
            database: DatabaseConfig::default(),
            store_retry: default_store_retry(),
            freshness: FreshnessConfig::default(),
            batch: BatchConfig::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `config.toml` (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` instead of `config.toml` when given
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config").required(false),
        };

        let config = Self::with_defaults(Config::builder())?
            // Load from file
            .add_source(file)
            // Override with environment variables (e.g., WEATHER_REFRESH_DATABASE__PATH)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("batch.locations"),
            )
            .build()?;
        config.try_deserialize()
    }

    fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let api = RetryConfig::default();
        let store = default_store_retry();
        builder
            .set_default("api_retry.max_retry_attempts", api.max_retry_attempts)?
            .set_default("api_retry.retry_delay_ms", api.retry_delay_ms)?
            .set_default("store_retry.max_retry_attempts", store.max_retry_attempts)?
            .set_default("store_retry.retry_delay_ms", store.retry_delay_ms)
    }

    /// Check the loaded values for problems serde cannot catch
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Configuration` listing every problem found.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        let mut problems = Vec::new();

        match Url::parse(&self.weather_api.base_url) {
            Ok(url) if url.cannot_be_a_base() => problems.push(format!(
                "weather_api.base_url cannot carry a path: {}",
                self.weather_api.base_url
            )),
            Ok(_) => {},
            Err(e) => problems.push(format!(
                "weather_api.base_url is invalid ({e}): {}",
                self.weather_api.base_url
            )),
        }

        if self.weather_api.timeout_secs == 0 {
            problems.push("weather_api.timeout_secs must be positive".to_string());
        }

        if self.database.path.trim().is_empty() {
            problems.push("database.path must not be empty".to_string());
        }

        if self.database.max_connections == 0 {
            problems.push("database.max_connections must be positive".to_string());
        }

        if self.freshness.threshold_minutes <= 0 {
            problems.push("freshness.threshold_minutes must be positive".to_string());
        } else if self.freshness.threshold().is_none() {
            problems.push(format!(
                "freshness.threshold_minutes out of range: {}",
                self.freshness.threshold_minutes
            ));
        }

        if self.batch.locations.is_empty() {
            problems.push("batch.locations must not be empty".to_string());
        }

        for location in &self.batch.locations {
            if let Err(e) = LocationName::new(location.as_str()) {
                problems.push(format!("batch.locations: {e}"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ApplicationError::Configuration(problems.join("; ")))
        }
    }

    /// Batch locations as validated names
    ///
    /// # Errors
    ///
    /// Returns a domain error for the first blank location.
    pub fn batch_locations(&self) -> Result<Vec<LocationName>, ApplicationError> {
        self.batch
            .locations
            .iter()
            .map(|name| LocationName::new(name.as_str()).map_err(ApplicationError::from))
            .collect()
    }
}
