//! Weather service
//!
//! Fetch-or-cache orchestration: serve a stored reading while it is fresh,
//! refresh it from the remote source once it goes stale, and fall back to
//! the stale copy when the refresh fails.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use domain::{LocationName, WeatherReading};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{WeatherSourcePort, WeatherStorePort},
};

/// Where a returned reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Stored reading within the freshness window
    Cached,
    /// Newly fetched from the remote source and stored
    Refreshed,
    /// Stored reading past the freshness window, served because the refresh failed
    StaleFallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Cached => "cached",
            Self::Refreshed => "refreshed",
            Self::StaleFallback => "stale_fallback",
        };
        f.write_str(label)
    }
}

/// A reading together with its provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherLookup {
    pub reading: WeatherReading,
    pub provenance: Provenance,
}

/// Service keeping the per-location weather cache fresh
pub struct WeatherService {
    source: Arc<dyn WeatherSourcePort>,
    store: Arc<dyn WeatherStorePort>,
    freshness_threshold: Duration,
}

impl fmt::Debug for WeatherService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherService")
            .field("freshness_threshold", &self.freshness_threshold)
            .finish_non_exhaustive()
    }
}

impl Clone for WeatherService {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            store: Arc::clone(&self.store),
            freshness_threshold: self.freshness_threshold,
        }
    }
}

impl WeatherService {
    /// Default freshness window in minutes
    pub const DEFAULT_FRESHNESS_MINUTES: i64 = 60;

    /// Create a new weather service
    #[must_use]
    pub fn new(
        source: Arc<dyn WeatherSourcePort>,
        store: Arc<dyn WeatherStorePort>,
        freshness_threshold: Duration,
    ) -> Self {
        Self {
            source,
            store,
            freshness_threshold,
        }
    }

    /// Freshness window used by this service
    pub const fn freshness_threshold(&self) -> Duration {
        self.freshness_threshold
    }

    /// Get the weather for a location, refreshing it if stale
    pub async fn get_weather(
        &self,
        location: &LocationName,
        cancel: &CancellationToken,
    ) -> Result<WeatherReading, ApplicationError> {
        self.get_weather_at(location, Utc::now(), cancel).await
    }

    /// Like [`Self::get_weather`], judging freshness against `now`
    pub async fn get_weather_at(
        &self,
        location: &LocationName,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<WeatherReading, ApplicationError> {
        self.lookup_at(location, now, cancel)
            .await
            .map(|lookup| lookup.reading)
    }

    /// Get the weather for a location along with its provenance
    pub async fn lookup(
        &self,
        location: &LocationName,
        cancel: &CancellationToken,
    ) -> Result<WeatherLookup, ApplicationError> {
        self.lookup_at(location, Utc::now(), cancel).await
    }

    /// Like [`Self::lookup`], judging freshness against `now`
    ///
    /// Store read and write failures propagate unchanged. A failed fetch
    /// falls back to the stored reading if there is one, and otherwise
    /// yields `NoDataAvailable` wrapping the fetch error. Cancellation is
    /// never masked by the fallback.
    #[instrument(skip(self, cancel), fields(location = %location))]
    pub async fn lookup_at(
        &self,
        location: &LocationName,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<WeatherLookup, ApplicationError> {
        let existing = self
            .store
            .get_latest(location, cancel)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to read cached weather"))?;

        let stale = match existing {
            Some(reading) if reading.is_fresh_at(now, self.freshness_threshold) => {
                debug!(observed_at = %reading.observed_at, "Serving cached weather");
                return Ok(WeatherLookup {
                    reading,
                    provenance: Provenance::Cached,
                });
            },
            other => other,
        };

        match self.source.fetch(location, cancel).await {
            Ok(reading) => {
                self.store
                    .upsert(&reading, cancel)
                    .await
                    .inspect_err(|e| error!(error = %e, "Failed to store refreshed weather"))?;
                info!(
                    observed_at = %reading.observed_at,
                    temperature = reading.temperature,
                    humidity = reading.humidity,
                    "Weather refreshed"
                );
                Ok(WeatherLookup {
                    reading,
                    provenance: Provenance::Refreshed,
                })
            },
            Err(ApplicationError::Cancelled) => Err(ApplicationError::Cancelled),
            Err(e) => {
                error!(error = %e, "Failed to fetch weather");
                match stale {
                    Some(reading) => {
                        warn!(
                            observed_at = %reading.observed_at,
                            "Serving stale cached weather after failed refresh"
                        );
                        Ok(WeatherLookup {
                            reading,
                            provenance: Provenance::StaleFallback,
                        })
                    },
                    None => Err(ApplicationError::no_data(location.clone(), e)),
                }
            },
        }
    }
}
