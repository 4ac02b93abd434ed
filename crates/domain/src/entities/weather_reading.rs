//! Weather reading entity - A single observation for one location

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{LocationName, ReadingId};

/// A weather observation as cached by the refresh service
///
/// `observed_at` is the time the measurement refers to and drives freshness.
/// `last_refreshed_at` records when this service last wrote the reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Opaque identity
    pub id: ReadingId,
    /// Natural key
    pub location: LocationName,
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// When the measurement was taken
    pub observed_at: DateTime<Utc>,
    /// When this service last stored the reading
    pub last_refreshed_at: DateTime<Utc>,
}

impl WeatherReading {
    /// Create a reading with a fresh id, stamped as refreshed at `observed_at`
    pub fn new(
        location: LocationName,
        temperature: f64,
        humidity: f64,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ReadingId::new(),
            location,
            temperature,
            humidity,
            observed_at,
            last_refreshed_at: observed_at,
        }
    }

    /// Replace the id
    #[must_use]
    pub const fn with_id(mut self, id: ReadingId) -> Self {
        self.id = id;
        self
    }

    /// Replace the refresh timestamp
    #[must_use]
    pub const fn with_last_refreshed_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_refreshed_at = at;
        self
    }

    /// Age of the observation relative to `now`
    ///
    /// Negative when `observed_at` lies in the future.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.observed_at
    }

    /// Whether the observation is at most `threshold` old at `now`
    ///
    /// Observations stamped in the future count as fresh.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.age_at(now) <= threshold
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn tokyo_at(observed_at: DateTime<Utc>) -> WeatherReading {
        WeatherReading::new(
            LocationName::new("Tokyo").unwrap(),
            21.5,
            64.0,
            observed_at,
        )
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn new_reading_is_stamped_at_observation() {
        let reading = tokyo_at(noon());
        assert_eq!(reading.last_refreshed_at, noon());
        assert_eq!(reading.location.as_str(), "Tokyo");
    }

    #[test]
    fn five_minutes_old_is_fresh_within_an_hour() {
        let reading = tokyo_at(noon() - Duration::minutes(5));
        assert!(reading.is_fresh_at(noon(), Duration::hours(1)));
    }

    #[test]
    fn two_hours_old_is_stale_within_an_hour() {
        let reading = tokyo_at(noon() - Duration::hours(2));
        assert!(!reading.is_fresh_at(noon(), Duration::hours(1)));
    }

    #[test]
    fn exactly_at_threshold_is_fresh() {
        let reading = tokyo_at(noon() - Duration::hours(1));
        assert!(reading.is_fresh_at(noon(), Duration::hours(1)));
    }

    #[test]
    fn just_past_threshold_is_stale() {
        let reading = tokyo_at(noon() - Duration::hours(1) - Duration::milliseconds(1));
        assert!(!reading.is_fresh_at(noon(), Duration::hours(1)));
    }

    #[test]
    fn future_observation_is_fresh() {
        let reading = tokyo_at(noon() + Duration::minutes(10));
        assert!(reading.age_at(noon()) < Duration::zero());
        assert!(reading.is_fresh_at(noon(), Duration::hours(1)));
    }

    #[test]
    fn builders_replace_fields() {
        let id = ReadingId::new();
        let later = noon() + Duration::minutes(3);
        let reading = tokyo_at(noon()).with_id(id).with_last_refreshed_at(later);
        assert_eq!(reading.id, id);
        assert_eq!(reading.last_refreshed_at, later);
        assert_eq!(reading.observed_at, noon());
    }

    #[test]
    fn serde_roundtrip_preserves_fields() {
        let reading = tokyo_at(noon());
        let json = serde_json::to_string(&reading).unwrap();
        let back: WeatherReading = serde_json::from_str(&json).unwrap();
        assert_eq!(reading, back);
    }
}
