//! Weather API integration
//!
//! Client for the upstream weather HTTP API (`GET {base_url}/weather/{location}`).
//! Returns raw readings; retrying and mapping into the domain happen in the
//! infrastructure adapter.

pub mod client;
mod models;

pub use client::{WeatherApiClient, WeatherApiConfig, WeatherApiError, WeatherClient};
pub use models::ApiReading;
