//! Mirroring of pushed images.

use acr_mirror_core::{Configuration, PushPayload};
use acr_mirror_registry::{
    ClientBuilder, ImportImageRequest, ImportMode, ImportSource, ImportSourceCredentials,
};

use crate::context::TargetContext;
use crate::error::{ReplicationError, Result};
use crate::outcome::Outcome;

/// Imports a pushed `repository:tag` from the source registry into the target.
///
/// The import always runs in [`ImportMode::Force`], so delivering the same
/// push twice overwrites the tag with the same content.
#[derive(Debug, Clone)]
pub struct ImportCommand {
    push: PushPayload,
    credentials: ImportSourceCredentials,
}

impl ImportCommand {
    /// Creates the command for `push`, pulling with the configured pull token.
    #[must_use]
    pub fn new(push: PushPayload, config: &Configuration) -> Self {
        Self {
            push,
            credentials: ImportSourceCredentials {
                username: config.source_pull_token_name.clone(),
                password: config.source_pull_token_password.clone(),
            },
        }
    }

    /// `repository:tag`, used as source image and as the only target tag.
    #[must_use]
    pub fn image_reference(&self) -> String {
        self.push.image_reference()
    }

    /// The request submitted to the target registry.
    #[must_use]
    pub fn request(&self) -> ImportImageRequest {
        let image = self.image_reference();
        ImportImageRequest::new(
            ImportSource {
                registry_uri: self.push.source_host.clone(),
                source_image: image.clone(),
                credentials: Some(self.credentials.clone()),
            },
            vec![image],
        )
        .with_mode(ImportMode::Force)
    }

    /// Runs the import and waits for it to complete.
    ///
    /// # Errors
    ///
    /// Returns [`ReplicationError::Authentication`] if no management token
    /// can be obtained and [`ReplicationError::RegistryOperation`] (or
    /// [`ReplicationError::RegistryNotFound`]) if the import fails.
    pub async fn execute(&self, target: &TargetContext, clients: &dyn ClientBuilder) -> Result<Outcome> {
        let image = self.image_reference();
        let management = clients
            .management(&target.credential, target.subscription_id())
            .await
            .map_err(|e| ReplicationError::from_registry("importImage", e))?;

        management
            .import_image(target.resource_group(), target.registry_name(), &self.request())
            .await
            .map_err(|e| ReplicationError::from_registry("importImage", e))?;

        let registry = target.resource_id.to_string();
        tracing::info!(
            image = %image,
            source = %self.push.source_host,
            registry = %registry,
            "Import of '{image}' succeeded"
        );

        Ok(Outcome::Imported { image, registry })
    }
}
