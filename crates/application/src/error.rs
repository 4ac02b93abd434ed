//! Application-level errors

use std::fmt;

use domain::{DomainError, LocationName};
use thiserror::Error;

/// Boxed underlying cause carried by I/O errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse classification of an [`ApplicationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Temporary I/O failure, worth retrying
    Transient,
    /// I/O failure that will not go away on retry
    Permanent,
    /// Nothing cached and the refresh failed
    NoData,
    /// Caller cancelled the operation
    Cancelled,
    /// Domain rule violated
    Domain,
    /// Invalid configuration
    Configuration,
    /// Bug or unexpected state
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Transient => "transient",
            Self::Permanent => "permanent",
            Self::NoData => "no_data",
            Self::Cancelled => "cancelled",
            Self::Domain => "domain",
            Self::Configuration => "configuration",
            Self::Internal => "internal",
        };
        f.write_str(label)
    }
}

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Temporary I/O failure (timeouts, unavailable services, busy database)
    #[error("Transient I/O error: {message}")]
    TransientIo {
        message: String,
        source: Option<BoxError>,
    },

    /// I/O failure that retrying will not fix
    #[error("I/O error: {message}")]
    PermanentIo {
        message: String,
        source: Option<BoxError>,
    },

    /// No cached reading and the remote refresh failed
    #[error("Unable to get weather data for location: {location}")]
    NoDataAvailable {
        location: LocationName,
        source: Box<ApplicationError>,
    },

    /// The caller's cancellation token fired
    #[error("Operation cancelled")]
    Cancelled,

    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Create a transient I/O error wrapping its cause
    pub fn transient(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::TransientIo {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a permanent I/O error wrapping its cause
    pub fn permanent(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::PermanentIo {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a no-data error for `location` caused by `source`
    pub fn no_data(location: LocationName, source: Self) -> Self {
        Self::NoDataAvailable {
            location,
            source: Box::new(source),
        }
    }

    /// Classification tag of this error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TransientIo { .. } => ErrorKind::Transient,
            Self::PermanentIo { .. } => ErrorKind::Permanent,
            Self::NoDataAvailable { .. } => ErrorKind::NoData,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Domain(_) => ErrorKind::Domain,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientIo { .. })
    }

    /// Check if this error was caused by cancellation
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[derive(Debug, Error)]
    #[error("connection reset")]
    struct ResetError;

    #[test]
    fn transient_is_retryable() {
        let err = ApplicationError::transient("weather API unreachable", ResetError);
        assert!(err.is_retryable());
        assert_eq!(err.kind(), ErrorKind::Transient);
        assert_eq!(err.to_string(), "Transient I/O error: weather API unreachable");
    }

    #[test]
    fn permanent_is_not_retryable() {
        let err = ApplicationError::permanent("HTTP 404", ResetError);
        assert!(!err.is_retryable());
        assert_eq!(err.kind(), ErrorKind::Permanent);
    }

    #[test]
    fn io_errors_preserve_source() {
        let err = ApplicationError::transient("read failed", ResetError);
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "connection reset");
        assert!(source.downcast_ref::<ResetError>().is_some());
    }

    #[test]
    fn string_sources_are_accepted() {
        let err = ApplicationError::permanent("bad body", "missing field `temperature`");
        assert_eq!(
            err.source().unwrap().to_string(),
            "missing field `temperature`"
        );
    }

    #[test]
    fn no_data_message_names_location() {
        let cause = ApplicationError::transient("timeout", ResetError);
        let err = ApplicationError::no_data(LocationName::new("Tokyo").unwrap(), cause);

        assert_eq!(
            err.to_string(),
            "Unable to get weather data for location: Tokyo"
        );
        assert_eq!(err.kind(), ErrorKind::NoData);
        assert!(!err.is_retryable());
        assert_eq!(
            err.source().unwrap().to_string(),
            "Transient I/O error: timeout"
        );
    }

    #[test]
    fn cancelled_kind() {
        let err = ApplicationError::Cancelled;
        assert!(err.is_cancelled());
        assert!(!err.is_retryable());
        assert_eq!(err.kind().to_string(), "cancelled");
    }

    #[test]
    fn domain_error_is_transparent() {
        let err: ApplicationError = DomainError::InvalidLocation(String::new()).into();
        assert_eq!(err.kind(), ErrorKind::Domain);
        assert_eq!(err.to_string(), "Invalid location: \"\"");
    }

    #[test]
    fn configuration_and_internal_messages() {
        assert_eq!(
            ApplicationError::Configuration("missing base_url".to_string()).to_string(),
            "Configuration error: missing base_url"
        );
        assert_eq!(
            ApplicationError::Internal("task panicked".to_string()).kind(),
            ErrorKind::Internal
        );
    }
}
