//! Error types for replication.

use acr_mirror_core::ValidationErrors;
use acr_mirror_registry::RegistryError;
use thiserror::Error;

/// Result type alias for replication.
pub type Result<T> = std::result::Result<T, ReplicationError>;

/// Reasons an invocation fails.
///
/// Undecodable and unrecognized events are not errors; they are reported as
/// [`Outcome`](crate::Outcome) values.
#[derive(Error, Debug)]
pub enum ReplicationError {
    /// One or more required settings are missing.
    #[error("invalid configuration: {0}")]
    Configuration(ValidationErrors),

    /// The target registry locator is malformed.
    #[error(transparent)]
    ResourceIdentifier(#[from] acr_mirror_core::Error),

    /// Credentials could not be built or were rejected.
    #[error("authentication failed: {0}")]
    Authentication(#[source] RegistryError),

    /// The target registry does not exist.
    #[error("target registry not found: {resource_id}")]
    RegistryNotFound {
        /// Registry resource id.
        resource_id: String,
    },

    /// An import or delete call failed.
    #[error("{operation} failed: {source}")]
    RegistryOperation {
        /// Operation that failed.
        operation: &'static str,
        /// Underlying error.
        #[source]
        source: RegistryError,
    },
}

impl ReplicationError {
    /// Classifies a registry error raised during `operation`.
    #[must_use]
    pub fn from_registry(operation: &'static str, err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownEnvironment { .. } | RegistryError::AuthenticationFailed { .. } => {
                Self::Authentication(err)
            }
            RegistryError::RegistryNotFound { resource_id } => Self::RegistryNotFound { resource_id },
            source => Self::RegistryOperation { operation, source },
        }
    }

    /// Returns true if redelivering the event could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::RegistryOperation { source, .. } => source.is_retryable(),
            Self::Configuration(_)
            | Self::ResourceIdentifier(_)
            | Self::Authentication(_)
            | Self::RegistryNotFound { .. } => false,
        }
    }
}
