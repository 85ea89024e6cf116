//! Shared primitives for all Rust crates in Medrova.

#![forbid(unsafe_code)]

/// Principal and request-scope primitives shared across services.
pub mod principal;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use principal::{Principal, RequestScope};

/// Result type used across Medrova crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Principal attempted to read a record outside its resolved access set.
    ///
    /// The message is fixed and reveals neither the record nor the rule that
    /// rejected it.
    #[error("access denied")]
    AccessDenied,

    /// A required enforcement mapping is absent. Deployment defect, not an
    /// authorization fact; never downgraded to allow or deny.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn access_denied_message_is_fixed() {
        assert_eq!(AppError::AccessDenied.to_string(), "access denied");
    }
}
