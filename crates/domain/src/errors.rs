//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Location name is empty or whitespace only
    #[error("Invalid location: {0:?}")]
    InvalidLocation(String),
}
