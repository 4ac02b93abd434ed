//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod weather_api_adapter;

pub use weather_api_adapter::WeatherApiAdapter;
