//! Weather API data models
//!
//! The upstream service is loose about field casing (`Temperature`,
//! `temperature`, `TEMPERATURE`), so keys are normalized before decoding.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::client::WeatherApiError;

/// A reading as returned by the weather API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiReading {
    /// Provider-side identifier, if any
    pub id: Option<String>,
    /// Location as echoed by the provider
    pub location: Option<String>,
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Observation time
    pub observed_at: DateTime<Utc>,
    /// Provider-side update time, if any
    pub last_updated: Option<DateTime<Utc>>,
}

/// Wire shape after key normalization
#[derive(Debug, Deserialize)]
struct RawReading {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    location: Option<String>,
    temperature: f64,
    humidity: f64,
    #[serde(alias = "observed_at")]
    timestamp: String,
    #[serde(default, alias = "last_updated")]
    lastupdated: Option<String>,
}

impl ApiReading {
    /// Decode a response body
    ///
    /// # Errors
    ///
    /// Returns `WeatherApiError::Parse` if the body is not a JSON object with
    /// the required fields or a timestamp cannot be parsed.
    pub fn from_json(body: &str) -> Result<Self, WeatherApiError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| WeatherApiError::Parse(format!("Invalid JSON: {e}")))?;

        let Value::Object(fields) = value else {
            return Err(WeatherApiError::Parse(
                "Expected a JSON object".to_string(),
            ));
        };

        let normalized: Map<String, Value> = fields
            .into_iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value))
            .collect();

        let raw: RawReading = serde_json::from_value(Value::Object(normalized))
            .map_err(|e| WeatherApiError::Parse(e.to_string()))?;

        Ok(Self {
            id: raw.id.and_then(id_to_string),
            location: raw.location,
            temperature: raw.temperature,
            humidity: raw.humidity,
            observed_at: parse_datetime(&raw.timestamp)?,
            last_updated: raw.lastupdated.as_deref().map(parse_datetime).transpose()?,
        })
    }
}

fn id_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a timestamp as RFC 3339, or as a naive date-time taken to be UTC
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, WeatherApiError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // 2024-06-01T12:00:00 with optional fractional seconds
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&dt));
    }

    // 2024-06-01T12:00
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Ok(Utc.from_utc_datetime(&dt));
    }

    Err(WeatherApiError::Parse(format!(
        "Invalid datetime format: {s}"
    )))
}
