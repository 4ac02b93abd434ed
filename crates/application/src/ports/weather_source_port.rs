//! Weather source port
//!
//! Defines the interface for fetching current readings from the remote
//! weather provider.

use async_trait::async_trait;
use domain::{LocationName, WeatherReading};
#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;

use crate::error::ApplicationError;

/// Port for the remote weather data source
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WeatherSourcePort: Send + Sync {
    /// Fetch the current reading for a location
    ///
    /// Implementations retry transient failures internally and return
    /// `ApplicationError::Cancelled` once `cancel` fires.
    async fn fetch(
        &self,
        location: &LocationName,
        cancel: &CancellationToken,
    ) -> Result<WeatherReading, ApplicationError>;
}
