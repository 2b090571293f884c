//! # acr-mirror registry
//!
//! Clients for the two surfaces of a container registry that replication
//! needs:
//!
//! - **Management API** ([`ManagementClient`]): resource manager calls scoped
//!   to a subscription. Looks up registries and runs `importImage`, waiting
//!   for the long-running operation to finish.
//! - **Data plane** ([`DataPlaneClient`]): OCI distribution calls against a
//!   registry's login server, authenticated with a repository-scoped token.
//!
//! Both are reached through traits ([`RegistryManagement`], [`ManifestStore`])
//! and created by a [`ClientBuilder`], so callers can swap in fakes.
//!
//! Credentials come from [`CredentialFactory`], which binds a service
//! principal to the endpoints of its [`AzureEnvironment`].
//!
//! ```rust,no_run
//! use acr_mirror_core::Configuration;
//! use acr_mirror_registry::{AzureClientBuilder, ClientBuilder, ClientConfig, CredentialFactory};
//!
//! # async fn run(config: &Configuration) -> Result<(), acr_mirror_registry::RegistryError> {
//! let credential = CredentialFactory::new().create(config)?;
//! let builder = AzureClientBuilder::new(ClientConfig::new());
//!
//! let management = builder.management(&credential, "subscription-id").await?;
//! let registry = management.get_registry("rg", "target").await?;
//!
//! let store = builder.data_plane(&credential, &registry.login_server).await?;
//! store.delete_manifest("app", "sha256:0123").await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;
mod credential;
mod data_plane;
mod environment;
mod error;
mod management;
mod models;

#[cfg(test)]
mod test_server;

pub use builder::{AzureClientBuilder, ClientBuilder};
pub use config::{ClientConfig, DEFAULT_API_VERSION};
pub use credential::{AccessToken, CredentialFactory, ServicePrincipalCredential};
pub use data_plane::{DataPlaneClient, ManifestStore};
pub use environment::{AzureEnvironment, CloudEndpoints};
pub use error::{RegistryError, Result};
pub use management::{ManagementClient, RegistryManagement};
pub use models::{
    ImportImageRequest, ImportMode, ImportSource, ImportSourceCredentials, RegistryDescriptor,
};
