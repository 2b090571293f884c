//! Canned configuration and events.
//!
//! All fixtures describe the same setup: a source registry at
//! [`SOURCE_HOST`] mirrored into [`REGISTRY_NAME`] in resource group
//! [`RESOURCE_GROUP`] of subscription [`SUBSCRIPTION_ID`].

use acr_mirror_core::event::{IMAGE_DELETED, IMAGE_PUSHED, SUBSCRIPTION_VALIDATION};
use acr_mirror_core::Configuration;
use serde_json::{json, Value};
use uuid::Uuid;

/// Target subscription.
pub const SUBSCRIPTION_ID: &str = "6c3b8f0e-2a4d-4b9e-9f61-0d2b7a5c1e34";

/// Target resource group.
pub const RESOURCE_GROUP: &str = "mirror-rg";

/// Target registry name.
pub const REGISTRY_NAME: &str = "mirrortarget";

/// Target registry resource id.
pub const TARGET_RESOURCE_ID: &str = "/subscriptions/6c3b8f0e-2a4d-4b9e-9f61-0d2b7a5c1e34/resourceGroups/mirror-rg/providers/Microsoft.ContainerRegistry/registries/mirrortarget";

/// Target registry login server.
pub const LOGIN_SERVER: &str = "mirrortarget.azurecr.cn";

/// Source registry login server.
pub const SOURCE_HOST: &str = "sourceregistry.azurecr.io";

/// A configuration with every field set.
#[must_use]
pub fn valid_configuration() -> Configuration {
    Configuration {
        target_environment_name: "AzureChinaCloud".to_string(),
        target_tenant_id: "72f988bf-86f1-41af-91ab-2d7cd011db47".to_string(),
        target_client_id: "3f1c2a9e-5b7d-4e21-8c6a-9d0e4f3b2a15".to_string(),
        target_client_secret: "target-client-secret".to_string(),
        target_registry_resource_id: TARGET_RESOURCE_ID.to_string(),
        source_pull_token_name: "mirror-pull".to_string(),
        source_pull_token_password: "pull-token-password".to_string(),
    }
}

/// An image push of `repository:tag` on [`SOURCE_HOST`].
#[must_use]
pub fn push_event(repository: &str, tag: &str) -> Value {
    EventBuilder::new(IMAGE_PUSHED)
        .repository(repository)
        .tag(tag)
        .digest("sha256:0b0f5bd9a3a4a1b0d0b8b6b1c6a0f2d3e4c5b6a7980102030405060708090a0b")
        .build()
}

/// A deletion of `repository@digest` on [`SOURCE_HOST`].
///
/// The event also carries a tag, which deletion must ignore.
#[must_use]
pub fn delete_event(repository: &str, digest: &str) -> Value {
    EventBuilder::new(IMAGE_DELETED)
        .repository(repository)
        .tag("latest")
        .digest(digest)
        .build()
}

/// A well-formed event of a type that is not mirrored.
#[must_use]
pub fn unrecognized_event() -> Value {
    EventBuilder::new("Microsoft.ContainerRegistry.ChartPushed")
        .repository("charts/app")
        .tag("1.0.0")
        .build()
}

/// The handshake sent when a webhook subscription is created.
#[must_use]
pub fn subscription_validation_event(code: &str) -> Value {
    json!({
        "id": Uuid::now_v7().to_string(),
        "topic": "/subscriptions/6c3b8f0e-2a4d-4b9e-9f61-0d2b7a5c1e34/resourceGroups/source-rg/providers/Microsoft.ContainerRegistry/registries/sourceregistry",
        "subject": "",
        "eventType": SUBSCRIPTION_VALIDATION,
        "eventTime": "2024-05-01T12:00:00Z",
        "data": {
            "validationCode": code,
            "validationUrl": "https://rp-eastus2.eventgrid.azure.net/eventsubscriptions/mirror/validate"
        },
        "dataVersion": "2",
        "metadataVersion": "1"
    })
}

/// Fluent builder for registry events in the Event Grid schema.
///
/// # Examples
///
/// ```rust
/// use acr_mirror_test::fixtures::EventBuilder;
///
/// let event = EventBuilder::new("Microsoft.ContainerRegistry.ImagePushed")
///     .repository("app")
///     .tag("v2")
///     .build();
/// assert_eq!(event["data"]["target"]["tag"], "v2");
/// ```
#[derive(Debug, Clone)]
pub struct EventBuilder {
    event_type: String,
    id: String,
    host: String,
    target: serde_json::Map<String, Value>,
    cloud_events: bool,
}

impl EventBuilder {
    /// Starts an event of `event_type` from [`SOURCE_HOST`].
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            id: Uuid::now_v7().to_string(),
            host: SOURCE_HOST.to_string(),
            target: serde_json::Map::new(),
            cloud_events: false,
        }
    }

    /// Sets the event id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the source registry host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets `target.repository`.
    #[must_use]
    pub fn repository(self, repository: &str) -> Self {
        self.target_field("repository", repository)
    }

    /// Sets `target.tag`.
    #[must_use]
    pub fn tag(self, tag: &str) -> Self {
        self.target_field("tag", tag)
    }

    /// Sets `target.digest`.
    #[must_use]
    pub fn digest(self, digest: &str) -> Self {
        self.target_field("digest", digest)
    }

    /// Emits the CloudEvents schema (`type`/`time`) instead.
    #[must_use]
    pub const fn cloud_events(mut self) -> Self {
        self.cloud_events = true;
        self
    }

    fn target_field(mut self, key: &str, value: &str) -> Self {
        self.target.insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    /// Builds the event.
    #[must_use]
    pub fn build(self) -> Value {
        let subject = match (self.target.get("repository"), self.target.get("tag")) {
            (Some(Value::String(repo)), Some(Value::String(tag))) => format!("{repo}:{tag}"),
            (Some(Value::String(repo)), _) => repo.clone(),
            _ => String::new(),
        };
        let data = json!({
            "id": Uuid::now_v7().to_string(),
            "timestamp": "2024-05-01T12:00:00Z",
            "target": Value::Object(self.target),
            "request": {
                "id": Uuid::now_v7().to_string(),
                "host": self.host,
                "method": "PUT",
                "useragent": "docker/24.0.7"
            }
        });

        if self.cloud_events {
            json!({
                "specversion": "1.0",
                "id": self.id,
                "source": "/subscriptions/6c3b8f0e-2a4d-4b9e-9f61-0d2b7a5c1e34/resourceGroups/source-rg/providers/Microsoft.ContainerRegistry/registries/sourceregistry",
                "subject": subject,
                "type": self.event_type,
                "time": "2024-05-01T12:00:00Z",
                "data": data
            })
        } else {
            json!({
                "id": self.id,
                "topic": "/subscriptions/6c3b8f0e-2a4d-4b9e-9f61-0d2b7a5c1e34/resourceGroups/source-rg/providers/Microsoft.ContainerRegistry/registries/sourceregistry",
                "subject": subject,
                "eventType": self.event_type,
                "eventTime": "2024-05-01T12:00:00Z",
                "data": data,
                "dataVersion": "1.0",
                "metadataVersion": "1"
            })
        }
    }
}
