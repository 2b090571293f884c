//! Mirroring of deleted images.

use acr_mirror_core::DeletePayload;
use acr_mirror_registry::{ClientBuilder, RegistryError};

use crate::context::TargetContext;
use crate::error::{ReplicationError, Result};
use crate::outcome::Outcome;

/// Deletes a manifest, addressed by digest, from the target registry.
#[derive(Debug, Clone)]
pub struct DeleteCommand {
    delete: DeletePayload,
}

impl DeleteCommand {
    /// Creates the command for `delete`.
    #[must_use]
    pub const fn new(delete: DeletePayload) -> Self {
        Self { delete }
    }

    /// Looks up the target login server and deletes the manifest there.
    ///
    /// A manifest the target does not have counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicationError::RegistryNotFound`] if the target registry
    /// does not exist, [`ReplicationError::Authentication`] if either token
    /// exchange fails, and [`ReplicationError::RegistryOperation`] for any
    /// other registry failure.
    pub async fn execute(&self, target: &TargetContext, clients: &dyn ClientBuilder) -> Result<Outcome> {
        let DeletePayload {
            repository, digest, ..
        } = &self.delete;

        let management = clients
            .management(&target.credential, target.subscription_id())
            .await
            .map_err(|e| ReplicationError::from_registry("getRegistry", e))?;
        let descriptor = management
            .get_registry(target.resource_group(), target.registry_name())
            .await
            .map_err(|e| ReplicationError::from_registry("getRegistry", e))?;

        tracing::debug!(login_server = %descriptor.login_server, "resolved target login server");

        let store = clients
            .data_plane(&target.credential, &descriptor.login_server)
            .await
            .map_err(|e| ReplicationError::from_registry("deleteManifest", e))?;

        let registry = target.resource_id.to_string();
        let already_absent = match store.delete_manifest(repository, digest).await {
            Ok(()) => {
                tracing::info!(
                    repository = %repository,
                    digest = %digest,
                    registry = %registry,
                    "Image '{repository}@{digest}' deleted"
                );
                false
            }
            Err(RegistryError::ManifestNotFound { .. }) => {
                tracing::info!(
                    repository = %repository,
                    digest = %digest,
                    registry = %registry,
                    "Image '{repository}@{digest}' already absent"
                );
                true
            }
            Err(e) => return Err(ReplicationError::from_registry("deleteManifest", e)),
        };

        Ok(Outcome::Deleted {
            repository: repository.clone(),
            digest: digest.clone(),
            registry,
            already_absent,
        })
    }
}
