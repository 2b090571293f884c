//! Invocation entry point.

use std::sync::Arc;

use acr_mirror_core::{Configuration, DecodedEvent, EventDecoder, Validate};
use acr_mirror_registry::{AzureClientBuilder, ClientBuilder, ClientConfig, CredentialFactory};
use serde_json::Value;
use tracing::{Instrument, Span};
use uuid::Uuid;

use crate::dispatcher::ReplicationDispatcher;
use crate::error::{ReplicationError, Result};
use crate::outcome::Outcome;

/// Runs one invocation per event: decode, validate, dispatch.
///
/// A replicator holds no per-event state and can be shared between
/// concurrent invocations.
///
/// # Example
///
/// ```rust,no_run
/// use acr_mirror_core::Configuration;
/// use acr_mirror_registry::ClientConfig;
/// use acr_mirror_replicator::Replicator;
///
/// # async fn run(raw: &str, config: &Configuration) -> acr_mirror_replicator::Result<()> {
/// let replicator = Replicator::azure(ClientConfig::new());
/// let outcome = replicator.handle(raw, config).await?;
/// println!("{outcome}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Replicator {
    dispatcher: ReplicationDispatcher,
}

impl Replicator {
    /// Creates a replicator that obtains registry clients from `clients`.
    #[must_use]
    pub fn new(clients: Arc<dyn ClientBuilder>) -> Self {
        Self::with_credentials(CredentialFactory::new(), clients)
    }

    /// Creates a replicator with a custom credential factory.
    #[must_use]
    pub fn with_credentials(credentials: CredentialFactory, clients: Arc<dyn ClientBuilder>) -> Self {
        Self {
            dispatcher: ReplicationDispatcher::new(credentials, clients),
        }
    }

    /// Creates a replicator talking to the real services.
    #[must_use]
    pub fn azure(config: ClientConfig) -> Self {
        Self::new(Arc::new(AzureClientBuilder::new(config)))
    }

    /// Handles one serialized event.
    ///
    /// Undecodable input is logged and reported as [`Outcome::Undecodable`]
    /// without looking at `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is incomplete or the registry work fails.
    pub async fn handle(&self, raw: &str, config: &Configuration) -> Result<Outcome> {
        async {
            match EventDecoder::decode(raw) {
                Ok(decoded) => self.process(decoded, config).await,
                Err(err) => Ok(undecodable(&err)),
            }
        }
        .instrument(invocation_span())
        .await
    }

    /// Handles one event that was already parsed as JSON.
    ///
    /// # Errors
    ///
    /// See [`Replicator::handle`].
    pub async fn handle_value(&self, value: Value, config: &Configuration) -> Result<Outcome> {
        async {
            match EventDecoder::decode_value(value) {
                Ok(decoded) => self.process(decoded, config).await,
                Err(err) => Ok(undecodable(&err)),
            }
        }
        .instrument(invocation_span())
        .await
    }

    /// Handles an already decoded event.
    ///
    /// # Errors
    ///
    /// See [`Replicator::handle`].
    pub async fn handle_decoded(&self, decoded: DecodedEvent, config: &Configuration) -> Result<Outcome> {
        self.process(decoded, config)
            .instrument(invocation_span())
            .await
    }

    async fn process(&self, decoded: DecodedEvent, config: &Configuration) -> Result<Outcome> {
        let span = Span::current();
        if let Some(id) = decoded.id.as_deref() {
            span.record("event_id", id);
        }
        span.record("event_type", decoded.event_type.as_str());

        if let Err(errors) = config.validate() {
            tracing::error!(
                missing = ?errors.fields(),
                "{}",
                errors
                    .first()
                    .map_or_else(|| "invalid configuration".to_string(), |e| e.message.clone())
            );
            return Err(ReplicationError::Configuration(errors));
        }

        let result = self.dispatcher.dispatch(&decoded, config).await;
        if let Err(err) = &result {
            tracing::error!(
                error = %err,
                retryable = err.is_retryable(),
                kind = decoded.event.kind(),
                "Replication failed"
            );
        }
        result
    }
}

fn invocation_span() -> Span {
    tracing::info_span!(
        "replicate",
        invocation_id = %Uuid::now_v7(),
        event_id = tracing::field::Empty,
        event_type = tracing::field::Empty,
    )
}

fn undecodable(err: &acr_mirror_core::Error) -> Outcome {
    tracing::error!(error = %err, "Could not parse the event as a registry event");
    let reason = match err {
        acr_mirror_core::Error::Decode { reason } => reason.clone(),
        other => other.to_string(),
    };
    Outcome::Undecodable { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acr_mirror_test::{fixtures, MockRegistry};

    fn replicator(registry: &MockRegistry) -> Replicator {
        Replicator::new(Arc::new(registry.clone()))
    }

    #[tokio::test]
    async fn test_empty_input_is_undecodable() {
        let registry = MockRegistry::new();
        let outcome = replicator(&registry)
            .handle("   ", &Configuration::default())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Undecodable {
                reason: "event text is empty".to_string()
            }
        );
        assert!(registry.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_configuration_stops_before_registry() {
        let registry = MockRegistry::new();
        let mut config = fixtures::valid_configuration();
        config.source_pull_token_password = String::new();

        let err = replicator(&registry)
            .handle(&fixtures::push_event("app", "v2").to_string(), &config)
            .await
            .unwrap_err();

        match err {
            ReplicationError::Configuration(errors) => {
                assert_eq!(errors.fields(), vec!["SourceACRPullTokenPassword"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(registry.calls().is_empty());
    }

    #[tokio::test]
    async fn test_handle_value_accepts_parsed_event() {
        let registry = MockRegistry::new();
        let outcome = replicator(&registry)
            .handle_value(
                fixtures::push_event("app", "v2"),
                &fixtures::valid_configuration(),
            )
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Imported { ref image, .. } if image == "app:v2"));
    }

    #[tokio::test]
    async fn test_handle_decoded() {
        let registry = MockRegistry::new();
        let decoded = EventDecoder::decode_value(fixtures::unrecognized_event()).unwrap();
        let outcome = replicator(&registry)
            .handle_decoded(decoded, &fixtures::valid_configuration())
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Ignored { .. }));
    }
}
