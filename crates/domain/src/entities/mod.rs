//! Domain entities - Objects with identity and lifecycle

mod weather_reading;

pub use weather_reading::WeatherReading;
