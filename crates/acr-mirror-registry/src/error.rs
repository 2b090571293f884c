//! Error types for registry operations.

use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur while talking to the identity provider, the
/// management API or a registry's data plane.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The cloud environment name is not one we know endpoints for.
    #[error("Unknown cloud environment '{name}'")]
    UnknownEnvironment {
        /// Environment name as configured.
        name: String,
    },

    /// Token acquisition failed or the service rejected our credentials.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed {
        /// Error message.
        message: String,
    },

    /// The target registry does not exist.
    #[error("Registry not found: {resource_id}")]
    RegistryNotFound {
        /// Registry resource id.
        resource_id: String,
    },

    /// The manifest does not exist in the repository.
    #[error("Manifest not found: {repository}@{reference}")]
    ManifestNotFound {
        /// Repository name.
        repository: String,
        /// Digest or tag.
        reference: String,
    },

    /// A long-running operation finished in a failed state.
    #[error("Operation '{operation}' failed: {message}")]
    OperationFailed {
        /// Operation name.
        operation: String,
        /// Error message reported by the service.
        message: String,
    },

    /// A long-running operation did not finish before the deadline.
    #[error("Operation '{operation}' timed out")]
    Timeout {
        /// Operation name.
        operation: String,
    },

    /// Failed to connect to a service endpoint.
    #[error("Failed to connect to {url}: {source}")]
    ConnectionFailed {
        /// Endpoint URL.
        url: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// Unexpected HTTP status.
    #[error("HTTP error: {status} - {message}")]
    HttpError {
        /// HTTP status code (0 if none was received).
        status: u16,
        /// Error message.
        message: String,
    },

    /// The service answered with a body we could not interpret.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },

    /// Invalid URL.
    #[error("Invalid URL: {url}")]
    InvalidUrl {
        /// URL string.
        url: String,
    },
}

impl RegistryError {
    /// Returns true if repeating the call later could succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => true,
            Self::HttpError { status, .. } => *status == 0 || *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            Self::ConnectionFailed {
                url: err
                    .url()
                    .map_or_else(|| "unknown".to_string(), ToString::to_string),
                source: err,
            }
        } else if err.is_decode() {
            Self::InvalidResponse {
                message: err.to_string(),
            }
        } else {
            Self::HttpError {
                status: err.status().map_or(0, |s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_registry_not_found() {
        let err = RegistryError::RegistryNotFound {
            resource_id: "/subscriptions/s/resourceGroups/rg/providers/Microsoft.ContainerRegistry/registries/r".to_string(),
        };
        assert!(err.to_string().starts_with("Registry not found: /subscriptions/s"));
    }

    #[test]
    fn test_error_display_manifest_not_found() {
        let err = RegistryError::ManifestNotFound {
            repository: "app".to_string(),
            reference: "sha256:abc".to_string(),
        };
        assert_eq!(err.to_string(), "Manifest not found: app@sha256:abc");
    }

    #[test]
    fn test_retryable_statuses() {
        let http = |status| RegistryError::HttpError {
            status,
            message: String::new(),
        };
        assert!(http(503).is_retryable());
        assert!(http(429).is_retryable());
        assert!(http(0).is_retryable());
        assert!(!http(400).is_retryable());
        assert!(!RegistryError::AuthenticationFailed {
            message: "denied".to_string()
        }
        .is_retryable());
    }
}
