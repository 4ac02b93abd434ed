//! Weather API adapter - Implements WeatherSourcePort using integration_weather

use std::sync::Arc;

use application::{error::ApplicationError, ports::WeatherSourcePort};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{LocationName, ReadingId, WeatherReading};
use integration_weather::{
    ApiReading, WeatherApiClient, WeatherApiConfig, WeatherApiError, WeatherClient,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::retry::{RetryConfig, retry};

/// Adapter fetching readings from the remote weather API with retries
pub struct WeatherApiAdapter {
    client: Arc<dyn WeatherClient>,
    retry: RetryConfig,
}

impl std::fmt::Debug for WeatherApiAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiAdapter")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl WeatherApiAdapter {
    /// Create an adapter backed by the reqwest client
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client fails to initialize.
    pub fn new(config: &WeatherApiConfig, retry: RetryConfig) -> Result<Self, ApplicationError> {
        let client = WeatherApiClient::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        Ok(Self::with_client(Arc::new(client), retry))
    }

    /// Create an adapter around any weather client
    #[must_use]
    pub fn with_client(client: Arc<dyn WeatherClient>, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    /// Map a client error into the application taxonomy, keeping it as source
    fn map_error(err: WeatherApiError) -> ApplicationError {
        let message = match &err {
            WeatherApiError::Http { status, .. } => format!("Weather API returned HTTP {status}"),
            WeatherApiError::Connection(_) => "Weather API unreachable".to_string(),
            WeatherApiError::Timeout(_) => "Weather API request timed out".to_string(),
            WeatherApiError::Request(_) => "Weather API request failed".to_string(),
            WeatherApiError::Parse(_) => "Weather API returned an unreadable reading".to_string(),
            WeatherApiError::InvalidBaseUrl(_) | WeatherApiError::InvalidHeader { .. } => {
                "Weather API client is misconfigured".to_string()
            },
        };

        if err.is_transient() {
            ApplicationError::transient(message, err)
        } else {
            ApplicationError::permanent(message, err)
        }
    }

    /// Build the domain reading, keyed by the requested location
    fn to_reading(
        location: &LocationName,
        reading: ApiReading,
        refreshed_at: DateTime<Utc>,
    ) -> WeatherReading {
        let id = reading
            .id
            .as_deref()
            .and_then(|id| ReadingId::parse(id).ok())
            .unwrap_or_default();

        WeatherReading {
            id,
            location: location.clone(),
            temperature: reading.temperature,
            humidity: reading.humidity,
            observed_at: reading.observed_at,
            last_refreshed_at: refreshed_at,
        }
    }
}

#[async_trait]
impl WeatherSourcePort for WeatherApiAdapter {
    #[instrument(skip(self, cancel), fields(location = %location))]
    async fn fetch(
        &self,
        location: &LocationName,
        cancel: &CancellationToken,
    ) -> Result<WeatherReading, ApplicationError> {
        info!("Fetching weather data");

        let reading = retry(&self.retry, cancel, ApplicationError::is_retryable, || async {
            self.client
                .fetch(location.as_str())
                .await
                .map_err(Self::map_error)
        })
        .await
        .inspect_err(|e| error!(error = %e, "Failed to get weather data"))?;

        if let Some(reported) = reading.location.as_deref() {
            if reported != location.as_str() {
                debug!(reported = %reported, "Weather API reported a different location name");
            }
        }

        Ok(Self::to_reading(location, reading, Utc::now()))
    }
}
