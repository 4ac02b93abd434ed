//! Refresh policy: freshness window and batch locations.

use serde::{Deserialize, Serialize};

/// How long a cached reading is served without refreshing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessConfig {
    /// Freshness window in minutes (default: 60)
    #[serde(default = "default_threshold_minutes")]
    pub threshold_minutes: i64,
}

const fn default_threshold_minutes() -> i64 {
    60
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            threshold_minutes: default_threshold_minutes(),
        }
    }
}

impl FreshnessConfig {
    /// Freshness window as a `chrono::Duration`
    ///
    /// `None` when the minute count does not fit a `chrono::Duration`.
    pub fn threshold(&self) -> Option<chrono::Duration> {
        chrono::Duration::try_minutes(self.threshold_minutes)
    }
}

/// Locations refreshed by a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Location names, processed in order
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,
}

fn default_locations() -> Vec<String> {
    ["Tokyo", "New York", "London"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            locations: default_locations(),
        }
    }
}
