//! Weather API client
//!
//! HTTP client for `GET {base_url}/weather/{location}`.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use reqwest::{
    Client, Url,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::models::ApiReading;

/// Longest response body kept in an HTTP error
const MAX_ERROR_BODY_LEN: usize = 512;

/// Weather API client errors
#[derive(Debug, Error)]
pub enum WeatherApiError {
    /// Base URL cannot be parsed or cannot carry a path
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// A configured default header is not a valid HTTP header
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// Could not connect to the weather service
    #[error("Connection failed: {0}")]
    Connection(#[source] reqwest::Error),

    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    /// Any other transport-level failure
    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// Service answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

impl WeatherApiError {
    /// Whether retrying the request may succeed
    ///
    /// Connection failures, timeouts, and HTTP 408, 429 and 5xx are transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout(_) => true,
            Self::Request(e) => e.is_request() || e.is_body(),
            Self::Http { status, .. } => is_transient_status(*status),
            Self::InvalidBaseUrl(_) | Self::InvalidHeader { .. } | Self::Parse(_) => false,
        }
    }

    /// HTTP status, if the service answered
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else if err.is_connect() {
            Self::Connection(err)
        } else {
            Self::Request(err)
        }
    }
}

fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429) || (500..600).contains(&status)
}

/// Weather API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherApiConfig {
    /// API base URL; `weather/{location}` is appended to its path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Headers sent with every request
    #[serde(default)]
    pub default_headers: HashMap<String, String>,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

const fn default_timeout() -> u64 {
    30
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            default_headers: HashMap::new(),
        }
    }
}

/// Weather client trait for fetching readings
#[async_trait]
pub trait WeatherClient: Send + Sync {
    /// Fetch the current reading for a location
    async fn fetch(&self, location: &str) -> Result<ApiReading, WeatherApiError>;
}

/// reqwest-backed weather API client
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    client: Client,
    base_url: Url,
}

impl WeatherApiClient {
    /// Create a new client with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or a default header is invalid, or the
    /// HTTP client cannot be initialized.
    pub fn new(config: &WeatherApiConfig) -> Result<Self, WeatherApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| WeatherApiError::InvalidBaseUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(WeatherApiError::InvalidBaseUrl(config.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(build_headers(&config.default_headers)?)
            .build()
            .map_err(WeatherApiError::Request)?;

        Ok(Self { client, base_url })
    }

    /// The parsed base URL
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base_url}/weather/{location}` with the location as one
    /// percent-encoded path segment
    pub fn weather_url(&self, location: &str) -> Result<Url, WeatherApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| WeatherApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("weather")
            .push(location);
        Ok(url)
    }
}

fn build_headers(headers: &HashMap<String, String>) -> Result<HeaderMap, WeatherApiError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| WeatherApiError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| WeatherApiError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY_LEN {
        let mut cut = MAX_ERROR_BODY_LEN;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

#[async_trait]
impl WeatherClient for WeatherApiClient {
    #[instrument(skip(self))]
    async fn fetch(&self, location: &str) -> Result<ApiReading, WeatherApiError> {
        let url = self.weather_url(location)?;
        debug!(url = %url, "Fetching weather reading");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(WeatherApiError::from_reqwest)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(WeatherApiError::from_reqwest)?;

        if !status.is_success() {
            return Err(WeatherApiError::Http {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        ApiReading::from_json(&body)
    }
}
