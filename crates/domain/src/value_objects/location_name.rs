//! Location name value object
//!
//! The natural key of a weather reading. Names are trimmed on construction
//! and must not be empty.
//!
//! # Examples
//!
//! ```
//! use domain::LocationName;
//!
//! let tokyo = LocationName::new("  Tokyo ").unwrap();
//! assert_eq!(tokyo.as_str(), "Tokyo");
//!
//! assert!(LocationName::new("   ").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// A validated, trimmed location name
///
/// Case is preserved: `"tokyo"` and `"Tokyo"` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocationName(String);

impl LocationName {
    /// Create a new location name
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidLocation` if the name is empty after trimming.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidLocation(name));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the value and return the inner string
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for LocationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LocationName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LocationName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for LocationName {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LocationName> for String {
    fn from(value: LocationName) -> Self {
        value.0
    }
}
