//! Batch refresh over the configured locations
//!
//! Locations are processed one after another. A failure for one location is
//! logged and counted; it never stops the rest of the batch.

use application::{ApplicationError, WeatherService};
use domain::LocationName;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Outcome counts of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    /// Whether every location was refreshed or served
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }
}

/// Refresh every location once, in order
pub async fn run_batch(
    service: &WeatherService,
    locations: &[LocationName],
    cancel: &CancellationToken,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for (index, location) in locations.iter().enumerate() {
        if cancel.is_cancelled() {
            summary.skipped = locations.len() - index;
            warn!(skipped = summary.skipped, "Batch cancelled, skipping remaining locations");
            break;
        }

        match service.lookup(location, cancel).await {
            Ok(lookup) => {
                summary.succeeded += 1;
                info!(
                    location = %location,
                    provenance = %lookup.provenance,
                    temperature = lookup.reading.temperature,
                    humidity = lookup.reading.humidity,
                    observed_at = %lookup.reading.observed_at,
                    "Weather data ready"
                );
            },
            Err(ApplicationError::Cancelled) => {
                summary.skipped = locations.len() - index;
                warn!(location = %location, "Batch cancelled during lookup");
                break;
            },
            Err(e) => {
                summary.failed += 1;
                error!(location = %location, error = %e, "Weather refresh failed");
            },
        }
    }

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        "Batch finished"
    );
    summary
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use application::{WeatherSourcePort, WeatherStorePort};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use domain::WeatherReading;
    use tokio::sync::Mutex;

    use super::*;

    /// Source that succeeds for every location except the listed ones
    struct StubSource {
        failing: Vec<&'static str>,
        cancel_after_first: Option<CancellationToken>,
    }

    #[async_trait]
    impl WeatherSourcePort for StubSource {
        async fn fetch(
            &self,
            location: &LocationName,
            _cancel: &CancellationToken,
        ) -> Result<WeatherReading, ApplicationError> {
            if let Some(token) = &self.cancel_after_first {
                token.cancel();
            }
            if self.failing.contains(&location.as_str()) {
                return Err(ApplicationError::permanent("HTTP 404", "unknown location"));
            }
            Ok(WeatherReading::new(location.clone(), 21.0, 55.0, Utc::now()))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<HashMap<String, WeatherReading>>,
    }

    #[async_trait]
    impl WeatherStorePort for MemoryStore {
        async fn get_latest(
            &self,
            location: &LocationName,
            _cancel: &CancellationToken,
        ) -> Result<Option<WeatherReading>, ApplicationError> {
            Ok(self.rows.lock().await.get(location.as_str()).cloned())
        }

        async fn upsert(
            &self,
            reading: &WeatherReading,
            _cancel: &CancellationToken,
        ) -> Result<(), ApplicationError> {
            self.rows
                .lock()
                .await
                .insert(reading.location.as_str().to_string(), reading.clone());
            Ok(())
        }
    }

    fn service(source: StubSource) -> WeatherService {
        WeatherService::new(
            Arc::new(source),
            Arc::new(MemoryStore::default()),
            Duration::hours(1),
        )
    }

    fn locations(names: &[&str]) -> Vec<LocationName> {
        names.iter().map(|n| LocationName::new(*n).unwrap()).collect()
    }

    #[tokio::test]
    async fn all_locations_succeed() {
        let service = service(StubSource {
            failing: vec![],
            cancel_after_first: None,
        });
        let summary = run_batch(
            &service,
            &locations(&["Tokyo", "New York", "London"]),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(summary.succeeded, 3);
        assert!(summary.is_success());
    }

    #[tokio::test]
    async fn failure_does_not_stop_batch() {
        let service = service(StubSource {
            failing: vec!["New York"],
            cancel_after_first: None,
        });
        let summary = run_batch(
            &service,
            &locations(&["Tokyo", "New York", "London"]),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(
            summary,
            BatchSummary {
                succeeded: 2,
                failed: 1,
                skipped: 0
            }
        );
        assert!(!summary.is_success());
    }

    #[tokio::test]
    async fn cancelled_before_start_skips_everything() {
        let service = service(StubSource {
            failing: vec![],
            cancel_after_first: None,
        });
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = run_batch(&service, &locations(&["Tokyo", "London"]), &cancel).await;

        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.skipped, 2);
    }

    #[tokio::test]
    async fn cancellation_mid_batch_skips_the_rest() {
        let cancel = CancellationToken::new();
        let service = service(StubSource {
            failing: vec![],
            cancel_after_first: Some(cancel.clone()),
        });

        let summary =
            run_batch(&service, &locations(&["Tokyo", "New York", "London"]), &cancel).await;

        // The first fetch completes before the token is checked again
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.skipped, 2);
    }
}
