//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod weather_source_port;
mod weather_store_port;

#[cfg(test)]
pub use weather_source_port::MockWeatherSourcePort;
pub use weather_source_port::WeatherSourcePort;
#[cfg(test)]
pub use weather_store_port::MockWeatherStorePort;
pub use weather_store_port::WeatherStorePort;
