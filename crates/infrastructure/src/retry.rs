//! Generic retry logic with a constant delay
//!
//! Re-runs a fallible async operation while a caller-supplied predicate
//! classifies its error as transient, waiting a fixed delay between
//! attempts. A [`CancellationToken`] stops the loop before an attempt,
//! during an attempt, or during the wait.
//!
//! # Example
//!
//! ```rust,ignore
//! use infrastructure::retry::{RetryConfig, retry};
//!
//! let config = RetryConfig::default();
//! let reading = retry(&config, &cancel, ApplicationError::is_retryable, || async {
//!     client.fetch("Tokyo").await.map_err(map_error)
//! })
//! .await?;
//! ```

use std::future::Future;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt (default: 3, so up to 4 attempts)
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,

    /// Delay between attempts in milliseconds (default: 2000ms)
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

const fn default_max_retry_attempts() -> u32 {
    3
}

const fn default_retry_delay() -> u64 {
    2000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: default_max_retry_attempts(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration
    #[must_use]
    pub const fn new(max_retry_attempts: u32, retry_delay_ms: u64) -> Self {
        Self {
            max_retry_attempts,
            retry_delay_ms,
        }
    }

    /// A configuration that never retries
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new(0, 0)
    }

    /// Delay between attempts
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Marker error produced when the cancellation token fires
///
/// Error types used with [`with_retry`] convert from it, so cancellation
/// surfaces in the caller's own error type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("Operation cancelled")]
pub struct Cancelled;

impl From<Cancelled> for application::ApplicationError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

/// Trait for errors that can be checked for retryability
pub trait Retryable {
    /// Returns true if this error is retryable
    fn is_retryable(&self) -> bool;
}

impl Retryable for application::ApplicationError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

/// Retry result containing either success or the last error
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The result of the operation
    pub result: Result<T, E>,
    /// Number of attempts made (1 = no retries, 2 = one retry, etc.)
    pub attempts: u32,
    /// Total time spent including retries
    pub total_duration: Duration,
}

impl<T, E> RetryResult<T, E> {
    /// Check if the operation succeeded
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Check if the operation failed
    #[must_use]
    pub const fn is_err(&self) -> bool {
        self.result.is_err()
    }

    /// Convert to standard Result, discarding metadata
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }

    fn finish(result: Result<T, E>, attempts: u32, start: Instant) -> Self {
        Self {
            result,
            attempts,
            total_duration: start.elapsed(),
        }
    }
}

/// Execute an async operation with retry logic
///
/// The operation runs once, then again after each failure for which
/// `should_retry` returns true, up to `max_retry_attempts` extra times.
/// The last error is returned unchanged. Cancellation yields
/// `E::from(Cancelled)` and no further attempt is started.
#[allow(clippy::cast_possible_truncation)]
pub async fn with_retry<F, Fut, T, E, P>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    should_retry: P,
    mut operation: F,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: From<Cancelled> + std::fmt::Display,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        if cancel.is_cancelled() {
            debug!(attempts = attempts, "Operation cancelled before attempt");
            return RetryResult::finish(Err(Cancelled.into()), attempts, start);
        }

        attempts += 1;
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(attempt = attempts, "Operation cancelled in flight");
                return RetryResult::finish(Err(Cancelled.into()), attempts, start);
            },
            result = operation() => result,
        };

        match result {
            Ok(value) => {
                if attempts > 1 {
                    debug!(
                        attempts = attempts,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Operation succeeded after retries"
                    );
                }
                return RetryResult::finish(Ok(value), attempts, start);
            },
            Err(err) => {
                if !should_retry(&err) {
                    debug!(
                        attempts = attempts,
                        error = %err,
                        "Operation failed with non-retryable error"
                    );
                    return RetryResult::finish(Err(err), attempts, start);
                }

                if attempts > config.max_retry_attempts {
                    warn!(
                        attempts = attempts,
                        max_retries = config.max_retry_attempts,
                        error = %err,
                        "Operation failed after max retries"
                    );
                    return RetryResult::finish(Err(err), attempts, start);
                }

                let delay = config.delay();
                warn!(
                    attempt = attempts,
                    max_retries = config.max_retry_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Operation failed, retrying"
                );

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => {
                        debug!(attempts = attempts, "Operation cancelled while waiting to retry");
                        return RetryResult::finish(Err(Cancelled.into()), attempts, start);
                    },
                    () = tokio::time::sleep(delay) => {},
                }
            },
        }
    }
}

/// Execute an async operation with retry logic, returning only the Result
///
/// This is a convenience wrapper around `with_retry` that discards metadata.
pub async fn retry<F, Fut, T, E, P>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    should_retry: P,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: From<Cancelled> + std::fmt::Display,
{
    with_retry(config, cancel, should_retry, operation)
        .await
        .into_result()
}

/// Like [`retry`], classifying errors through [`Retryable`]
pub async fn retry_retryable<F, Fut, T, E>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + From<Cancelled> + std::fmt::Display,
{
    retry(config, cancel, E::is_retryable, operation).await
}
