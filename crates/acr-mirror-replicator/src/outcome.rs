//! Result of a successful invocation.

use std::fmt;

use serde::Serialize;

/// What an invocation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The pushed image was imported into the target registry.
    Imported {
        /// `repository:tag` that was imported.
        image: String,
        /// Target registry resource id.
        registry: String,
    },

    /// The manifest was removed from the target registry.
    Deleted {
        /// Repository.
        repository: String,
        /// Manifest digest.
        digest: String,
        /// Target registry resource id.
        registry: String,
        /// The target did not have the manifest.
        already_absent: bool,
    },

    /// The event is of a kind that is not mirrored.
    Ignored {
        /// Raw event type.
        event_type: String,
    },

    /// The event could not be decoded.
    Undecodable {
        /// Decode error message.
        reason: String,
    },
}

impl Outcome {
    /// Returns true if the target registry was changed (or already matched).
    #[must_use]
    pub const fn is_replicated(&self) -> bool {
        matches!(self, Self::Imported { .. } | Self::Deleted { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imported { image, registry } => write!(f, "imported '{image}' into {registry}"),
            Self::Deleted {
                repository,
                digest,
                registry,
                already_absent: false,
            } => write!(f, "deleted '{repository}@{digest}' from {registry}"),
            Self::Deleted {
                repository,
                digest,
                registry,
                already_absent: true,
            } => write!(f, "'{repository}@{digest}' already absent from {registry}"),
            Self::Ignored { event_type } => write!(f, "ignored event of type '{event_type}'"),
            Self::Undecodable { reason } => write!(f, "undecodable event: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_tagged() {
        let outcome = Outcome::Imported {
            image: "app:v2".to_string(),
            registry: "/subscriptions/s".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "outcome": "imported", "image": "app:v2", "registry": "/subscriptions/s" })
        );
    }

    #[test]
    fn test_display_already_absent() {
        let outcome = Outcome::Deleted {
            repository: "app".to_string(),
            digest: "sha256:abc".to_string(),
            registry: "r".to_string(),
            already_absent: true,
        };
        assert_eq!(outcome.to_string(), "'app@sha256:abc' already absent from r");
        assert!(outcome.is_replicated());
    }

    #[test]
    fn test_ignored_is_not_replicated() {
        let outcome = Outcome::Ignored {
            event_type: "Microsoft.ContainerRegistry.ChartPushed".to_string(),
        };
        assert!(!outcome.is_replicated());
    }
}
