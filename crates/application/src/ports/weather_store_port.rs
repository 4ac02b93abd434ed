//! Weather store port
//!
//! Persistence of the latest reading per location.

use async_trait::async_trait;
use domain::{LocationName, WeatherReading};
#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;

use crate::error::ApplicationError;

/// Port for the weather reading cache
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WeatherStorePort: Send + Sync {
    /// Get the reading with the greatest `observed_at` for a location
    ///
    /// Returns `Ok(None)` when nothing is stored for the location.
    async fn get_latest(
        &self,
        location: &LocationName,
        cancel: &CancellationToken,
    ) -> Result<Option<WeatherReading>, ApplicationError>;

    /// Insert the reading, or overwrite the stored one for its location
    async fn upsert(
        &self,
        reading: &WeatherReading,
        cancel: &CancellationToken,
    ) -> Result<(), ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn WeatherStorePort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn WeatherStorePort>();
    }
}
