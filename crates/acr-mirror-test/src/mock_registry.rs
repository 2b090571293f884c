//! In-memory stand-in for the target registry.
//!
//! [`MockRegistry`] implements [`ClientBuilder`] and hands out management and
//! data-plane clients that record every call instead of making HTTP
//! requests. Clones share the same recording, so a test can keep one handle
//! and give another to the code under test.
//!
//! ```rust
//! use acr_mirror_test::MockRegistry;
//!
//! let registry = MockRegistry::new().without_manifests();
//! assert!(registry.calls().is_empty());
//! ```

use std::sync::Arc;

use acr_mirror_core::ResourceIdentifier;
use acr_mirror_registry::{
    ClientBuilder, ImportImageRequest, ManifestStore, RegistryDescriptor, RegistryError,
    RegistryManagement, Result, ServicePrincipalCredential,
};
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::fixtures;

/// One call made against the mock, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    /// A management client was requested.
    Management {
        /// Subscription the client was scoped to.
        subscription_id: String,
    },
    /// `importImage` was submitted.
    ImportImage {
        /// Resource group.
        resource_group: String,
        /// Registry name.
        registry_name: String,
        /// Source image of the request.
        source_image: String,
    },
    /// The registry resource was fetched.
    GetRegistry {
        /// Resource group.
        resource_group: String,
        /// Registry name.
        registry_name: String,
    },
    /// A data-plane client was requested.
    DataPlane {
        /// Login server the client was created for.
        login_server: String,
    },
    /// A manifest delete was issued.
    DeleteManifest {
        /// Repository.
        repository: String,
        /// Digest.
        digest: String,
    },
}

/// A recorded import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    /// Subscription of the management client.
    pub subscription_id: String,
    /// Resource group.
    pub resource_group: String,
    /// Registry name.
    pub registry_name: String,
    /// The full request body.
    pub request: ImportImageRequest,
}

/// A recorded manifest delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRecord {
    /// Login server of the data-plane client.
    pub login_server: String,
    /// Repository.
    pub repository: String,
    /// Digest.
    pub digest: String,
}

#[derive(Debug)]
struct State {
    login_server: String,
    reject_credentials: bool,
    registry_missing: bool,
    manifests_missing: bool,
    import_failure: Option<u16>,
    delete_failure: Option<u16>,
    calls: Vec<RegistryCall>,
    imports: Vec<ImportRecord>,
    deletes: Vec<DeleteRecord>,
}

/// Recording fake of the target registry.
#[derive(Debug, Clone)]
pub struct MockRegistry {
    state: Arc<Mutex<State>>,
}

impl Default for MockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRegistry {
    /// A registry at [`fixtures::LOGIN_SERVER`] that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                login_server: fixtures::LOGIN_SERVER.to_string(),
                reject_credentials: false,
                registry_missing: false,
                manifests_missing: false,
                import_failure: None,
                delete_failure: None,
                calls: Vec::new(),
                imports: Vec::new(),
                deletes: Vec::new(),
            })),
        }
    }

    /// Reports `login_server` from registry lookups.
    #[must_use]
    pub fn with_login_server(self, login_server: impl Into<String>) -> Self {
        self.state.lock().login_server = login_server.into();
        self
    }

    /// Fails client creation as if the token exchange was rejected.
    #[must_use]
    pub fn reject_credentials(self) -> Self {
        self.state.lock().reject_credentials = true;
        self
    }

    /// Answers lookups and imports as if the registry does not exist.
    ///
    /// Lookups fail with `RegistryNotFound`; imports fail the way the service
    /// rejects an import into a missing registry.
    #[must_use]
    pub fn without_registry(self) -> Self {
        self.state.lock().registry_missing = true;
        self
    }

    /// Answers deletes as if the manifest does not exist.
    #[must_use]
    pub fn without_manifests(self) -> Self {
        self.state.lock().manifests_missing = true;
        self
    }

    /// Fails imports with an HTTP `status`.
    #[must_use]
    pub fn fail_imports_with_status(self, status: u16) -> Self {
        self.state.lock().import_failure = Some(status);
        self
    }

    /// Fails deletes with an HTTP `status`.
    #[must_use]
    pub fn fail_deletes_with_status(self, status: u16) -> Self {
        self.state.lock().delete_failure = Some(status);
        self
    }

    /// Every call, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RegistryCall> {
        self.state.lock().calls.clone()
    }

    /// Imports that were submitted, including failed ones.
    #[must_use]
    pub fn imports(&self) -> Vec<ImportRecord> {
        self.state.lock().imports.clone()
    }

    /// Deletes that were issued, including failed ones.
    #[must_use]
    pub fn deletes(&self) -> Vec<DeleteRecord> {
        self.state.lock().deletes.clone()
    }

    fn credential_check(&self) -> Result<()> {
        if self.state.lock().reject_credentials {
            return Err(RegistryError::AuthenticationFailed {
                message: "invalid_client: AADSTS7000215: Invalid client secret provided."
                    .to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ClientBuilder for MockRegistry {
    async fn management(
        &self,
        _credential: &ServicePrincipalCredential,
        subscription_id: &str,
    ) -> Result<Box<dyn RegistryManagement>> {
        self.state.lock().calls.push(RegistryCall::Management {
            subscription_id: subscription_id.to_string(),
        });
        self.credential_check()?;
        Ok(Box::new(MockManagement {
            registry: self.clone(),
            subscription_id: subscription_id.to_string(),
        }))
    }

    async fn data_plane(
        &self,
        _credential: &ServicePrincipalCredential,
        login_server: &str,
    ) -> Result<Box<dyn ManifestStore>> {
        self.state.lock().calls.push(RegistryCall::DataPlane {
            login_server: login_server.to_string(),
        });
        self.credential_check()?;
        Ok(Box::new(MockManifestStore {
            registry: self.clone(),
            login_server: login_server.to_string(),
        }))
    }
}

struct MockManagement {
    registry: MockRegistry,
    subscription_id: String,
}

impl MockManagement {
    fn not_found(&self, resource_group: &str, registry_name: &str) -> RegistryError {
        RegistryError::RegistryNotFound {
            resource_id: ResourceIdentifier::new(&self.subscription_id, resource_group, registry_name)
                .to_string(),
        }
    }
}

#[async_trait]
impl RegistryManagement for MockManagement {
    async fn import_image(
        &self,
        resource_group: &str,
        registry_name: &str,
        request: &ImportImageRequest,
    ) -> Result<()> {
        let mut state = self.registry.state.lock();
        state.calls.push(RegistryCall::ImportImage {
            resource_group: resource_group.to_string(),
            registry_name: registry_name.to_string(),
            source_image: request.source.source_image.clone(),
        });
        state.imports.push(ImportRecord {
            subscription_id: self.subscription_id.clone(),
            resource_group: resource_group.to_string(),
            registry_name: registry_name.to_string(),
            request: request.clone(),
        });

        if state.registry_missing {
            return Err(RegistryError::OperationFailed {
                operation: "importImage".to_string(),
                message: format!(
                    "ResourceNotFound: {}",
                    self.not_found(resource_group, registry_name)
                ),
            });
        }
        if let Some(status) = state.import_failure {
            return Err(RegistryError::HttpError {
                status,
                message: "import rejected".to_string(),
            });
        }
        Ok(())
    }

    async fn get_registry(
        &self,
        resource_group: &str,
        registry_name: &str,
    ) -> Result<RegistryDescriptor> {
        let mut state = self.registry.state.lock();
        state.calls.push(RegistryCall::GetRegistry {
            resource_group: resource_group.to_string(),
            registry_name: registry_name.to_string(),
        });

        if state.registry_missing {
            return Err(self.not_found(resource_group, registry_name));
        }
        Ok(RegistryDescriptor {
            id: Some(
                ResourceIdentifier::new(&self.subscription_id, resource_group, registry_name)
                    .to_string(),
            ),
            name: Some(registry_name.to_string()),
            location: Some("chinanorth3".to_string()),
            login_server: state.login_server.clone(),
        })
    }
}

struct MockManifestStore {
    registry: MockRegistry,
    login_server: String,
}

#[async_trait]
impl ManifestStore for MockManifestStore {
    async fn delete_manifest(&self, repository: &str, digest: &str) -> Result<()> {
        let mut state = self.registry.state.lock();
        state.calls.push(RegistryCall::DeleteManifest {
            repository: repository.to_string(),
            digest: digest.to_string(),
        });
        state.deletes.push(DeleteRecord {
            login_server: self.login_server.clone(),
            repository: repository.to_string(),
            digest: digest.to_string(),
        });

        if state.manifests_missing {
            return Err(RegistryError::ManifestNotFound {
                repository: repository.to_string(),
                reference: digest.to_string(),
            });
        }
        if let Some(status) = state.delete_failure {
            return Err(RegistryError::HttpError {
                status,
                message: "delete rejected".to_string(),
            });
        }
        Ok(())
    }
}
