//! Target registry resolved from configuration.

use acr_mirror_core::{Configuration, ResourceIdentifier};
use acr_mirror_registry::{CredentialFactory, ServicePrincipalCredential};

use crate::error::{ReplicationError, Result};

/// The target registry and the principal used to reach it.
///
/// Built fresh for every command; nothing is cached between invocations.
#[derive(Debug, Clone)]
pub struct TargetContext {
    /// Parsed target registry locator.
    pub resource_id: ResourceIdentifier,
    /// Target service principal.
    pub credential: ServicePrincipalCredential,
}

impl TargetContext {
    /// Parses the target locator, then builds the credential.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicationError::ResourceIdentifier`] for a malformed
    /// locator and [`ReplicationError::Authentication`] if the credential
    /// cannot be built.
    pub fn resolve(config: &Configuration, credentials: &CredentialFactory) -> Result<Self> {
        let resource_id = ResourceIdentifier::parse(&config.target_registry_resource_id)?;
        let credential = credentials
            .create(config)
            .map_err(|e| ReplicationError::from_registry("createCredential", e))?;

        Ok(Self {
            resource_id,
            credential,
        })
    }

    /// Subscription of the target registry.
    #[must_use]
    pub fn subscription_id(&self) -> &str {
        self.resource_id.subscription_id()
    }

    /// Resource group of the target registry.
    #[must_use]
    pub fn resource_group(&self) -> &str {
        self.resource_id.resource_group_name()
    }

    /// Name of the target registry.
    #[must_use]
    pub fn registry_name(&self) -> &str {
        self.resource_id.registry_name()
    }
}
