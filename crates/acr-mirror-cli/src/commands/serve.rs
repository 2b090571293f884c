//! Webhook server receiving events pushed by the event source.
//!
//! `POST /api/events` takes a batch (JSON array) or a single event. Every
//! event in a batch is one invocation and all of them run concurrently. The
//! response is `500` if any invocation failed so that the source redelivers
//! the batch, and `200` otherwise, including for undecodable or unrecognized
//! events.

use std::net::SocketAddr;
use std::sync::Arc;

use acr_mirror_core::{Configuration, EventEnvelope, Validate};
use acr_mirror_replicator::{Outcome, ReplicationError, Replicator};
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Args;
use serde_json::{json, Value};

use super::settings::{ClientArgs, ConfigArgs};

/// Arguments for the serve command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "ACR_MIRROR_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub client: ClientArgs,
}

#[derive(Clone)]
struct AppState {
    replicator: Replicator,
    settings: Arc<ConfigArgs>,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs) -> Result<()> {
    if let Err(errors) = args.config.load()?.validate() {
        // Handshakes need no configuration; invocations fail individually.
        tracing::warn!(missing = ?errors.fields(), "configuration is incomplete");
    }

    let state = AppState {
        replicator: Replicator::azure(args.client.client_config()),
        settings: Arc::new(args.config),
    };

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    tracing::info!(address = %args.listen, "listening for events");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/events", post(receive_events))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}

type Reply = (StatusCode, Json<Value>);

async fn receive_events(State(state): State<AppState>, body: String) -> Reply {
    let events = match serde_json::from_str::<Value>(&body) {
        Ok(Value::Array(events)) => events,
        Ok(event) => vec![event],
        Err(_) => {
            // Not JSON, so the replicator reports it as undecodable before
            // looking at any configuration.
            return match state.replicator.handle(&body, &Configuration::default()).await {
                Ok(outcome) => (StatusCode::OK, Json(json!([outcome]))),
                Err(err) => replication_failure(&err),
            };
        }
    };

    if let Some(code) = events.iter().find_map(validation_code) {
        tracing::info!("answering subscription validation");
        return (StatusCode::OK, Json(json!({ "validationResponse": code })));
    }

    let invocations = events.into_iter().map(|event| invoke(&state, event));
    let results = futures::future::join_all(invocations).await;

    let mut outcomes = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(response) => return response,
        }
    }
    (StatusCode::OK, Json(json!(outcomes)))
}

/// One invocation. Settings are read again every time so that rotated
/// secrets apply without a restart.
async fn invoke(state: &AppState, event: Value) -> std::result::Result<Outcome, Reply> {
    let config = state.settings.load().map_err(|err| {
        tracing::error!(error = %format!("{err:#}"), "failed to load configuration");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": format!("{err:#}"), "retryable": true })),
        )
    })?;

    state
        .replicator
        .handle_value(event, &config)
        .await
        .map_err(|err| replication_failure(&err))
}

fn validation_code(event: &Value) -> Option<String> {
    EventEnvelope::from_value(event.clone())
        .ok()
        .and_then(|envelope| envelope.subscription_validation_code().map(str::to_string))
}

fn replication_failure(err: &ReplicationError) -> Reply {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": err.to_string(), "retryable": err.is_retryable() })),
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use acr_mirror_test::{fixtures, MockRegistry};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn settings_file(config: &Configuration) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(config).unwrap()).unwrap();
        file
    }

    fn state(registry: &MockRegistry, settings: ConfigArgs) -> AppState {
        AppState {
            replicator: Replicator::new(Arc::new(registry.clone())),
            settings: Arc::new(settings),
        }
    }

    fn configured(registry: &MockRegistry, file: &NamedTempFile) -> AppState {
        state(
            registry,
            ConfigArgs {
                settings: Some(file.path().to_path_buf()),
                ..ConfigArgs::default()
            },
        )
    }

    #[tokio::test]
    async fn test_subscription_validation_handshake() {
        let registry = MockRegistry::new();
        let body = json!([fixtures::subscription_validation_event("512d38b6-c7b8-40c8-89fe-f46f9e9622b6")]);

        let (status, Json(response)) =
            receive_events(State(state(&registry, ConfigArgs::default())), body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            response,
            json!({ "validationResponse": "512d38b6-c7b8-40c8-89fe-f46f9e9622b6" })
        );
        assert!(registry.calls().is_empty());
    }

    #[tokio::test]
    async fn test_batch_runs_every_event() {
        let registry = MockRegistry::new();
        let file = settings_file(&fixtures::valid_configuration());
        let body = json!([
            fixtures::push_event("app", "v1"),
            fixtures::delete_event("app", "sha256:abc"),
            fixtures::unrecognized_event(),
        ]);

        let (status, Json(response)) =
            receive_events(State(configured(&registry, &file)), body.to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response.as_array().map(Vec::len), Some(3));
        assert_eq!(registry.imports().len(), 1);
        assert_eq!(registry.deletes().len(), 1);
    }

    #[tokio::test]
    async fn test_single_event_body() {
        let registry = MockRegistry::new();
        let file = settings_file(&fixtures::valid_configuration());
        let (status, _) = receive_events(
            State(configured(&registry, &file)),
            fixtures::push_event("app", "v1").to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(registry.imports().len(), 1);
    }

    #[tokio::test]
    async fn test_settings_are_reloaded_per_invocation() {
        let registry = MockRegistry::new();
        let file = settings_file(&fixtures::valid_configuration());
        let state = configured(&registry, &file);
        let body = fixtures::push_event("app", "v1").to_string();

        let (status, _) = receive_events(State(state.clone()), body.clone()).await;
        assert_eq!(status, StatusCode::OK);

        let mut rotated = fixtures::valid_configuration();
        rotated.source_pull_token_password = "rotated-password".to_string();
        std::fs::write(file.path(), serde_json::to_string(&rotated).unwrap()).unwrap();

        let (status, _) = receive_events(State(state), body).await;
        assert_eq!(status, StatusCode::OK);

        let passwords: Vec<String> = registry
            .imports()
            .iter()
            .map(|import| {
                import
                    .request
                    .source
                    .credentials
                    .as_ref()
                    .map(|c| c.password.clone())
                    .unwrap_or_default()
            })
            .collect();
        assert_eq!(passwords, ["pull-token-password", "rotated-password"]);
    }

    #[tokio::test]
    async fn test_unreadable_settings_is_retryable_server_error() {
        let registry = MockRegistry::new();
        let settings = ConfigArgs {
            settings: Some(std::path::PathBuf::from("/nonexistent/settings.json")),
            ..ConfigArgs::default()
        };

        let (status, Json(response)) = receive_events(
            State(state(&registry, settings)),
            fixtures::push_event("app", "v1").to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response["retryable"], true);
        assert!(registry.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_returns_server_error() {
        let registry = MockRegistry::new().fail_imports_with_status(503);
        let file = settings_file(&fixtures::valid_configuration());
        let (status, Json(response)) = receive_events(
            State(configured(&registry, &file)),
            fixtures::push_event("app", "v1").to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response["retryable"], true);
    }

    #[tokio::test]
    async fn test_garbage_is_acknowledged() {
        let registry = MockRegistry::new();
        let (status, Json(response)) = receive_events(
            State(state(&registry, ConfigArgs::default())),
            "definitely not json".to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response[0]["outcome"], "undecodable");
        assert!(registry.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_configuration_is_server_error() {
        let registry = MockRegistry::new();
        let (status, Json(response)) = receive_events(
            State(state(&registry, ConfigArgs::default())),
            fixtures::push_event("app", "v1").to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response["retryable"], false);
    }
}
