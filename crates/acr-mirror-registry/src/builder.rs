//! Construction of registry clients.
//!
//! The replicator asks a [`ClientBuilder`] for clients instead of creating
//! them directly so that tests can substitute an in-memory registry.

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::credential::ServicePrincipalCredential;
use crate::data_plane::{DataPlaneClient, ManifestStore};
use crate::error::Result;
use crate::management::{ManagementClient, RegistryManagement};

/// Creates management and data-plane clients for a credential.
#[async_trait]
pub trait ClientBuilder: Send + Sync {
    /// Management client scoped to `subscription_id`.
    async fn management(
        &self,
        credential: &ServicePrincipalCredential,
        subscription_id: &str,
    ) -> Result<Box<dyn RegistryManagement>>;

    /// Data-plane client for the registry at `login_server`.
    async fn data_plane(
        &self,
        credential: &ServicePrincipalCredential,
        login_server: &str,
    ) -> Result<Box<dyn ManifestStore>>;
}

/// [`ClientBuilder`] producing HTTP clients.
#[derive(Debug, Clone, Default)]
pub struct AzureClientBuilder {
    config: ClientConfig,
}

impl AzureClientBuilder {
    /// Creates a builder whose clients use `config`.
    #[must_use]
    pub const fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Client configuration handed to every client.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl ClientBuilder for AzureClientBuilder {
    async fn management(
        &self,
        credential: &ServicePrincipalCredential,
        subscription_id: &str,
    ) -> Result<Box<dyn RegistryManagement>> {
        let client =
            ManagementClient::connect(credential, subscription_id, self.config.clone()).await?;
        Ok(Box::new(client))
    }

    async fn data_plane(
        &self,
        credential: &ServicePrincipalCredential,
        login_server: &str,
    ) -> Result<Box<dyn ManifestStore>> {
        let client = DataPlaneClient::new(credential, login_server, &self.config)?;
        Ok(Box::new(client))
    }
}
