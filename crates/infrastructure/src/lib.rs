//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: the retrying weather
//! API adapter and the SQLite reading store. Also owns configuration loading
//! and the retry executor they share.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod retry;

pub use adapters::*;
pub use config::{AppConfig, BatchConfig, DatabaseConfig, FreshnessConfig, LogFormat};
pub use persistence::{ConnectionPool, DatabaseError, SqliteWeatherStore, create_pool};
pub use retry::{
    Cancelled, RetryConfig, RetryResult, Retryable, retry, retry_retryable, with_retry,
};
