//! Error types for acr-mirror core operations.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The registry resource locator does not have the expected shape.
    #[error("Invalid resource identifier '{value}': {reason}")]
    InvalidResourceId {
        /// The locator as configured.
        value: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The event text could not be decoded into a lifecycle event.
    #[error("Failed to decode event: {reason}")]
    Decode {
        /// Reason for the decode failure.
        reason: String,
    },
}

impl Error {
    pub(crate) fn invalid_resource_id(value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidResourceId {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }
}
