//! Wire models for the container registry management API.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether an import may overwrite existing tags in the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportMode {
    /// Overwrite existing tags.
    #[default]
    Force,
    /// Fail if a target tag already exists.
    NoForce,
}

/// Body of an `importImage` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportImageRequest {
    /// Where the image is pulled from.
    pub source: ImportSource,

    /// Tags to create in the target registry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_tags: Vec<String>,

    /// Overwrite behavior.
    #[serde(default)]
    pub mode: ImportMode,
}

impl ImportImageRequest {
    /// Creates a forced import of `source` under the given target tags.
    #[must_use]
    pub const fn new(source: ImportSource, target_tags: Vec<String>) -> Self {
        Self {
            source,
            target_tags,
            mode: ImportMode::Force,
        }
    }

    /// Sets the import mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: ImportMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Source of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSource {
    /// Login server of the source registry, e.g. `src.azurecr.io`.
    pub registry_uri: String,

    /// `repository:tag` or `repository@digest`.
    pub source_image: String,

    /// Pull credentials for the source registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<ImportSourceCredentials>,
}

/// Username/password presented to the source registry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSourceCredentials {
    /// Username, e.g. a scoped pull token name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl fmt::Debug for ImportSourceCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportSourceCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The parts of a registry resource we care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryDescriptor {
    /// Full resource id, if the service sent it.
    pub id: Option<String>,
    /// Registry name.
    pub name: Option<String>,
    /// Region.
    pub location: Option<String>,
    /// Data-plane host name, e.g. `target.azurecr.cn`.
    pub login_server: String,
}

impl<'de> Deserialize<'de> for RegistryDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Properties {
            login_server: String,
        }

        #[derive(Deserialize)]
        struct Raw {
            id: Option<String>,
            name: Option<String>,
            location: Option<String>,
            properties: Properties,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(Self {
            id: raw.id,
            name: raw.name,
            location: raw.location,
            login_server: raw.properties.login_server,
        })
    }
}

/// Resource manager error envelope: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ArmErrorResponse {
    pub error: ArmError,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ArmError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for ArmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code.is_empty(), self.message.is_empty()) {
            (false, false) => write!(f, "{}: {}", self.code, self.message),
            (false, true) => f.write_str(&self.code),
            _ => f.write_str(&self.message),
        }
    }
}

/// Body returned by an `Azure-AsyncOperation` status URL.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AsyncOperationStatus {
    pub status: String,
    #[serde(default)]
    pub error: Option<ArmError>,
}

/// State of a long-running operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperationState {
    InProgress,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationState {
    pub fn parse(status: &str) -> Self {
        if status.eq_ignore_ascii_case("Succeeded") {
            Self::Succeeded
        } else if status.eq_ignore_ascii_case("Failed") {
            Self::Failed
        } else if status.eq_ignore_ascii_case("Canceled") || status.eq_ignore_ascii_case("Cancelled") {
            Self::Canceled
        } else {
            Self::InProgress
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_import_request_wire_shape() {
        let request = ImportImageRequest::new(
            ImportSource {
                registry_uri: "src.azurecr.io".to_string(),
                source_image: "app:1.0".to_string(),
                credentials: Some(ImportSourceCredentials {
                    username: "pull".to_string(),
                    password: "pw".to_string(),
                }),
            },
            vec!["app:1.0".to_string()],
        );

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "source": {
                    "registryUri": "src.azurecr.io",
                    "sourceImage": "app:1.0",
                    "credentials": { "username": "pull", "password": "pw" }
                },
                "targetTags": ["app:1.0"],
                "mode": "Force"
            })
        );
    }

    #[test]
    fn test_import_request_without_credentials() {
        let request = ImportImageRequest::new(
            ImportSource {
                registry_uri: "src.azurecr.io".to_string(),
                source_image: "app:1.0".to_string(),
                credentials: None,
            },
            vec![],
        )
        .with_mode(ImportMode::NoForce);

        let value = serde_json::to_value(&request).unwrap();
        assert!(value["source"].get("credentials").is_none());
        assert!(value.get("targetTags").is_none());
        assert_eq!(value["mode"], "NoForce");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = ImportSourceCredentials {
            username: "pull".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{creds:?}").contains("hunter2"));
    }

    #[test]
    fn test_registry_descriptor_from_arm() {
        let descriptor: RegistryDescriptor = serde_json::from_value(json!({
            "id": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.ContainerRegistry/registries/target",
            "name": "target",
            "location": "chinaeast2",
            "sku": { "name": "Premium" },
            "properties": { "loginServer": "target.azurecr.cn", "adminUserEnabled": false }
        }))
        .unwrap();

        assert_eq!(descriptor.login_server, "target.azurecr.cn");
        assert_eq!(descriptor.name.as_deref(), Some("target"));
        assert_eq!(descriptor.location.as_deref(), Some("chinaeast2"));
    }

    #[test]
    fn test_operation_state_parse() {
        assert_eq!(OperationState::parse("Succeeded"), OperationState::Succeeded);
        assert_eq!(OperationState::parse("failed"), OperationState::Failed);
        assert_eq!(OperationState::parse("Canceled"), OperationState::Canceled);
        assert_eq!(OperationState::parse("Running"), OperationState::InProgress);
    }

    #[test]
    fn test_arm_error_display() {
        let err: ArmErrorResponse = serde_json::from_value(json!({
            "error": { "code": "InvalidParameters", "message": "bad source" }
        }))
        .unwrap();
        assert_eq!(err.error.to_string(), "InvalidParameters: bad source");
    }
}
