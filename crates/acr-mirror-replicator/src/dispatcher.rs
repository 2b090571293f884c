//! Routing of decoded events to commands.

use std::sync::Arc;

use acr_mirror_core::{Configuration, DecodedEvent, ReplicationEvent};
use acr_mirror_registry::{ClientBuilder, CredentialFactory};

use crate::context::TargetContext;
use crate::delete::DeleteCommand;
use crate::error::Result;
use crate::import::ImportCommand;
use crate::outcome::Outcome;

/// Sends each event to at most one command.
#[derive(Clone)]
pub struct ReplicationDispatcher {
    credentials: CredentialFactory,
    clients: Arc<dyn ClientBuilder>,
}

impl ReplicationDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(credentials: CredentialFactory, clients: Arc<dyn ClientBuilder>) -> Self {
        Self {
            credentials,
            clients,
        }
    }

    /// Runs the command for `decoded`.
    ///
    /// `config` must already be validated.
    ///
    /// # Errors
    ///
    /// Returns the command's error; unrecognized events never fail.
    pub async fn dispatch(&self, decoded: &DecodedEvent, config: &Configuration) -> Result<Outcome> {
        match &decoded.event {
            ReplicationEvent::Pushed(push) => {
                tracing::info!(
                    repository = %push.repository,
                    tag = %push.tag,
                    source = %push.source_host,
                    "Received a push event for '{}'",
                    push.image_reference()
                );
                let target = TargetContext::resolve(config, &self.credentials)?;
                ImportCommand::new(push.clone(), config)
                    .execute(&target, self.clients.as_ref())
                    .await
            }
            ReplicationEvent::Deleted(delete) => {
                tracing::info!(
                    repository = %delete.repository,
                    digest = %delete.digest,
                    source = %delete.source_host,
                    "Received a delete event for '{}@{}'",
                    delete.repository,
                    delete.digest
                );
                let target = TargetContext::resolve(config, &self.credentials)?;
                DeleteCommand::new(delete.clone())
                    .execute(&target, self.clients.as_ref())
                    .await
            }
            ReplicationEvent::Unrecognized { event_type } => {
                tracing::warn!(
                    event_type = %event_type,
                    "Received an unexpected event; expected a push or delete"
                );
                Ok(Outcome::Ignored {
                    event_type: event_type.clone(),
                })
            }
        }
    }
}

impl std::fmt::Debug for ReplicationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationDispatcher")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
