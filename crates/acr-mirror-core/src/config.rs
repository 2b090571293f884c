//! Replication configuration.
//!
//! A [`Configuration`] is built once per invocation by the host (from
//! environment variables, a settings file, or flags) and is read-only after
//! that. Field names on the wire match the host's setting keys in [`keys`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::{Validate, ValidationError, ValidationErrors};

/// Setting keys, in the order [`Configuration::validate`] checks them.
pub mod keys {
    /// Target cloud environment name (e.g. `AzureGlobalCloud`).
    pub const TARGET_ENVIRONMENT_NAME: &str = "TargetAzureEnvironmentName";
    /// Tenant of the target service principal.
    pub const TARGET_TENANT_ID: &str = "TargetAzureServicePrincipalTenantId";
    /// Client id of the target service principal.
    pub const TARGET_CLIENT_ID: &str = "TargetAzureServicePrincipalClientId";
    /// Client secret of the target service principal.
    pub const TARGET_CLIENT_SECRET: &str = "TargetAzureServicePrincipalClientKey";
    /// Resource id of the target registry.
    pub const TARGET_REGISTRY_RESOURCE_ID: &str = "TargetACRResourceId";
    /// Name of the pull token on the source registry.
    pub const SOURCE_PULL_TOKEN_NAME: &str = "SourceACRPullTokenName";
    /// Password of the pull token on the source registry.
    pub const SOURCE_PULL_TOKEN_PASSWORD: &str = "SourceACRPullTokenPassword";

    /// All keys in validation order.
    pub const ALL: [&str; 7] = [
        TARGET_ENVIRONMENT_NAME,
        TARGET_TENANT_ID,
        TARGET_CLIENT_ID,
        TARGET_CLIENT_SECRET,
        TARGET_REGISTRY_RESOURCE_ID,
        SOURCE_PULL_TOKEN_NAME,
        SOURCE_PULL_TOKEN_PASSWORD,
    ];
}

/// Settings required to replicate one event into the target registry.
///
/// Missing settings deserialize as empty strings so that [`Validate`] can
/// name every one of them.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Target cloud environment name, e.g. `AzureChinaCloud`.
    #[serde(rename = "TargetAzureEnvironmentName")]
    pub target_environment_name: String,

    /// Tenant id of the service principal that can import into the target registry.
    #[serde(rename = "TargetAzureServicePrincipalTenantId")]
    pub target_tenant_id: String,

    /// Client (application) id of the target service principal.
    #[serde(rename = "TargetAzureServicePrincipalClientId")]
    pub target_client_id: String,

    /// Client secret of the target service principal.
    #[serde(rename = "TargetAzureServicePrincipalClientKey")]
    pub target_client_secret: String,

    /// Target registry resource id:
    /// `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.ContainerRegistry/registries/{name}`.
    #[serde(rename = "TargetACRResourceId")]
    pub target_registry_resource_id: String,

    /// Token on the source registry used by the target to pull images.
    /// Should only carry pull permissions.
    #[serde(rename = "SourceACRPullTokenName")]
    pub source_pull_token_name: String,

    /// Password of [`Self::source_pull_token_name`].
    #[serde(rename = "SourceACRPullTokenPassword")]
    pub source_pull_token_password: String,
}

impl Configuration {
    /// Returns the value stored under a setting key, if the key is known.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            keys::TARGET_ENVIRONMENT_NAME => &self.target_environment_name,
            keys::TARGET_TENANT_ID => &self.target_tenant_id,
            keys::TARGET_CLIENT_ID => &self.target_client_id,
            keys::TARGET_CLIENT_SECRET => &self.target_client_secret,
            keys::TARGET_REGISTRY_RESOURCE_ID => &self.target_registry_resource_id,
            keys::SOURCE_PULL_TOKEN_NAME => &self.source_pull_token_name,
            keys::SOURCE_PULL_TOKEN_PASSWORD => &self.source_pull_token_password,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Sets the value stored under a setting key. Returns false for unknown keys.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        let slot = match key {
            keys::TARGET_ENVIRONMENT_NAME => &mut self.target_environment_name,
            keys::TARGET_TENANT_ID => &mut self.target_tenant_id,
            keys::TARGET_CLIENT_ID => &mut self.target_client_id,
            keys::TARGET_CLIENT_SECRET => &mut self.target_client_secret,
            keys::TARGET_REGISTRY_RESOURCE_ID => &mut self.target_registry_resource_id,
            keys::SOURCE_PULL_TOKEN_NAME => &mut self.source_pull_token_name,
            keys::SOURCE_PULL_TOKEN_PASSWORD => &mut self.source_pull_token_password,
            _ => return false,
        };
        *slot = value.into();
        true
    }
}

impl Validate for Configuration {
    fn validate(&self) -> Result<(), ValidationErrors> {
        keys::ALL
            .iter()
            .filter(|key| self.get(key).map_or(true, |value| value.trim().is_empty()))
            .map(|key| ValidationError::required(*key))
            .collect::<ValidationErrors>()
            .into_result()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("target_environment_name", &self.target_environment_name)
            .field("target_tenant_id", &self.target_tenant_id)
            .field("target_client_id", &self.target_client_id)
            .field("target_client_secret", &"<redacted>")
            .field("target_registry_resource_id", &self.target_registry_resource_id)
            .field("source_pull_token_name", &self.source_pull_token_name)
            .field("source_pull_token_password", &"<redacted>")
            .finish()
    }
}
