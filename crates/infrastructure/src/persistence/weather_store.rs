//! SQLite weather store implementation
//!
//! Implements the `WeatherStorePort`, keeping one row per location.

use std::sync::Arc;

use application::{error::ApplicationError, ports::WeatherStorePort};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use domain::{LocationName, ReadingId, WeatherReading};
use rusqlite::{ErrorCode, OptionalExtension, Row, params, types::Type};
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::connection::ConnectionPool;
use crate::retry::{RetryConfig, retry};

const SELECT_LATEST: &str = "SELECT id, location, temperature, humidity, observed_at, last_refreshed_at
     FROM weather_readings
     WHERE location = ?1
     ORDER BY observed_at DESC
     LIMIT 1";

const UPSERT: &str = "INSERT INTO weather_readings (id, location, temperature, humidity, observed_at, last_refreshed_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT(location) DO UPDATE SET
         temperature = excluded.temperature,
         humidity = excluded.humidity,
         observed_at = excluded.observed_at,
         last_refreshed_at = excluded.last_refreshed_at";

/// SQLite-based weather reading store
#[derive(Debug, Clone)]
pub struct SqliteWeatherStore {
    pool: Arc<ConnectionPool>,
    retry: RetryConfig,
}

impl SqliteWeatherStore {
    /// Create a new SQLite weather store
    #[must_use]
    pub const fn new(pool: Arc<ConnectionPool>, retry: RetryConfig) -> Self {
        Self { pool, retry }
    }
}

#[async_trait]
impl WeatherStorePort for SqliteWeatherStore {
    #[instrument(skip(self, cancel), fields(location = %location))]
    async fn get_latest(
        &self,
        location: &LocationName,
        cancel: &CancellationToken,
    ) -> Result<Option<WeatherReading>, ApplicationError> {
        retry(&self.retry, cancel, ApplicationError::is_retryable, || {
            let pool = Arc::clone(&self.pool);
            let location = location.as_str().to_owned();
            async move {
                task::spawn_blocking(move || select_latest(&pool, &location))
                    .await
                    .map_err(|e| ApplicationError::Internal(e.to_string()))?
            }
        })
        .await
    }

    #[instrument(skip(self, reading, cancel), fields(location = %reading.location, reading_id = %reading.id))]
    async fn upsert(
        &self,
        reading: &WeatherReading,
        cancel: &CancellationToken,
    ) -> Result<(), ApplicationError> {
        retry(&self.retry, cancel, ApplicationError::is_retryable, || {
            let pool = Arc::clone(&self.pool);
            let reading = reading.clone();
            async move {
                task::spawn_blocking(move || upsert_reading(&pool, &reading))
                    .await
                    .map_err(|e| ApplicationError::Internal(e.to_string()))?
            }
        })
        .await
    }
}

fn select_latest(
    pool: &ConnectionPool,
    location: &str,
) -> Result<Option<WeatherReading>, ApplicationError> {
    let conn = pool.get().map_err(map_pool_error)?;

    let reading = conn
        .query_row(SELECT_LATEST, [location], row_to_reading)
        .optional()
        .map_err(|e| map_sqlite_error("Failed to read weather reading", e))?;

    debug!(found = reading.is_some(), "Loaded latest weather reading");
    Ok(reading)
}

fn upsert_reading(pool: &ConnectionPool, reading: &WeatherReading) -> Result<(), ApplicationError> {
    let conn = pool.get().map_err(map_pool_error)?;

    conn.execute(
        UPSERT,
        params![
            reading.id.to_string(),
            reading.location.as_str(),
            reading.temperature,
            reading.humidity,
            format_timestamp(reading.observed_at),
            format_timestamp(reading.last_refreshed_at),
        ],
    )
    .map_err(|e| map_sqlite_error("Failed to store weather reading", e))?;

    debug!("Stored weather reading");
    Ok(())
}

/// Fixed-width UTC text so lexicographic order matches time order
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_reading(row: &Row<'_>) -> rusqlite::Result<WeatherReading> {
    let id_str: String = row.get(0)?;
    let location_str: String = row.get(1)?;
    let temperature: f64 = row.get(2)?;
    let humidity: f64 = row.get(3)?;
    let observed_at_str: String = row.get(4)?;
    let last_refreshed_at_str: String = row.get(5)?;

    let id = ReadingId::parse(&id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;
    let location = LocationName::new(location_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    Ok(WeatherReading {
        id,
        location,
        temperature,
        humidity,
        observed_at: parse_timestamp(4, &observed_at_str)?,
        last_refreshed_at: parse_timestamp(5, &last_refreshed_at_str)?,
    })
}

/// Busy and locked databases clear up on their own; everything else is permanent
fn is_transient_sqlite(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

fn map_sqlite_error(context: &str, err: rusqlite::Error) -> ApplicationError {
    if is_transient_sqlite(&err) {
        ApplicationError::transient(format!("{context}: database busy"), err)
    } else {
        ApplicationError::permanent(context, err)
    }
}

/// r2d2 only fails checkouts by timing out
fn map_pool_error(err: r2d2::Error) -> ApplicationError {
    ApplicationError::transient("Timed out waiting for a database connection", err)
}
