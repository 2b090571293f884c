//! Registry lifecycle events.
//!
//! The source registry publishes one envelope per lifecycle change. Only two
//! kinds matter for mirroring: an image was pushed, or an image was deleted.
//! Everything else decodes to [`ReplicationEvent::Unrecognized`] so the caller
//! can log it and move on.
//!
//! Both the Event Grid schema (`eventType`, `eventTime`) and the CloudEvents
//! schema (`type`, `time`) are accepted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// Event type of an image push on the source registry.
pub const IMAGE_PUSHED: &str = "Microsoft.ContainerRegistry.ImagePushed";

/// Event type of an image (manifest) deletion on the source registry.
pub const IMAGE_DELETED: &str = "Microsoft.ContainerRegistry.ImageDeleted";

/// Event type of the handshake sent when a webhook subscription is created.
pub const SUBSCRIPTION_VALIDATION: &str = "Microsoft.EventGrid.SubscriptionValidationEvent";

/// The outer envelope of a lifecycle event. `data` is left opaque.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    /// Event id assigned by the publisher.
    #[serde(default)]
    pub id: Option<String>,

    /// Publisher-defined subject, e.g. `app:v2`.
    #[serde(default)]
    pub subject: Option<String>,

    /// Raw event type string.
    #[serde(alias = "type")]
    pub event_type: String,

    /// When the publisher emitted the event. Unparseable timestamps read as
    /// `None`; the time is only logged.
    #[serde(default, alias = "time", deserialize_with = "lenient_time")]
    pub event_time: Option<DateTime<Utc>>,

    /// Event payload.
    #[serde(default)]
    pub data: Value,
}

impl EventEnvelope {
    /// Parses an envelope from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the value is not an event envelope.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| Error::decode(format!("not an event envelope: {e}")))
    }

    /// Returns the validation code if this is a webhook subscription handshake.
    #[must_use]
    pub fn subscription_validation_code(&self) -> Option<&str> {
        if !self.event_type.eq_ignore_ascii_case(SUBSCRIPTION_VALIDATION) {
            return None;
        }
        self.data.get("validationCode").and_then(Value::as_str)
    }
}

fn lenient_time<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Payload of an image push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushPayload {
    /// Repository the image was pushed to.
    pub repository: String,
    /// Tag that was pushed.
    pub tag: String,
    /// Login host of the source registry.
    pub source_host: String,
}

impl PushPayload {
    /// Returns `repository:tag`, used both as the source image and target tag.
    #[must_use]
    pub fn image_reference(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }
}

/// Payload of an image deletion.
///
/// Deletions are addressed by digest. A tag may have been moved to another
/// manifest between the push and the delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePayload {
    /// Repository the manifest was deleted from.
    pub repository: String,
    /// Digest of the deleted manifest.
    pub digest: String,
    /// Login host of the source registry.
    pub source_host: String,
}

/// A classified lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationEvent {
    /// An image was pushed to the source registry.
    Pushed(PushPayload),
    /// An image was deleted from the source registry.
    Deleted(DeletePayload),
    /// A well-formed event of a kind that is not mirrored.
    Unrecognized {
        /// The raw event type, kept for logging.
        event_type: String,
    },
}

impl ReplicationEvent {
    /// Short name of the variant, for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Pushed(_) => "pushed",
            Self::Deleted(_) => "deleted",
            Self::Unrecognized { .. } => "unrecognized",
        }
    }
}

/// A decoded event together with the envelope fields worth logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedEvent {
    /// Event id, if the publisher set one.
    pub id: Option<String>,
    /// Raw event type.
    pub event_type: String,
    /// Publish time, if present.
    pub event_time: Option<DateTime<Utc>>,
    /// The classified event.
    pub event: ReplicationEvent,
}

#[derive(Debug, Default, Deserialize)]
struct RawImageData {
    #[serde(default)]
    target: RawTarget,
    #[serde(default)]
    request: RawRequest,
}

#[derive(Debug, Default, Deserialize)]
struct RawTarget {
    repository: Option<String>,
    tag: Option<String>,
    digest: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRequest {
    host: Option<String>,
}

/// Turns raw event text into a [`DecodedEvent`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EventDecoder;

impl EventDecoder {
    /// Decodes one event from its serialized form.
    ///
    /// A JSON array holding exactly one event is accepted as well, since
    /// webhook deliveries are batched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the text is empty, is not JSON, is not an
    /// envelope, or is a push/delete event whose data lacks a required field.
    pub fn decode(raw: &str) -> Result<DecodedEvent> {
        if raw.trim().is_empty() {
            return Err(Error::decode("event text is empty"));
        }
        let value: Value =
            serde_json::from_str(raw).map_err(|e| Error::decode(format!("invalid JSON: {e}")))?;
        Self::decode_value(value)
    }

    /// Decodes one event from an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// See [`EventDecoder::decode`].
    pub fn decode_value(value: Value) -> Result<DecodedEvent> {
        let value = match value {
            Value::Array(mut events) => {
                if events.len() != 1 {
                    return Err(Error::decode(format!(
                        "expected a single event, got a batch of {}",
                        events.len()
                    )));
                }
                events.remove(0)
            }
            other => other,
        };
        Self::decode_envelope(EventEnvelope::from_value(value)?)
    }

    /// Classifies a parsed envelope.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if a push/delete payload is missing a field.
    pub fn decode_envelope(envelope: EventEnvelope) -> Result<DecodedEvent> {
        let event_type = envelope.event_type.trim().to_string();
        if event_type.is_empty() {
            return Err(Error::decode("event type is empty"));
        }

        let event = if is_type(&event_type, IMAGE_PUSHED) {
            let data = image_data(&event_type, envelope.data)?;
            ReplicationEvent::Pushed(PushPayload {
                repository: required(data.target.repository, "target.repository")?,
                tag: required(data.target.tag, "target.tag")?,
                source_host: required(data.request.host, "request.host")?,
            })
        } else if is_type(&event_type, IMAGE_DELETED) {
            let data = image_data(&event_type, envelope.data)?;
            ReplicationEvent::Deleted(DeletePayload {
                repository: required(data.target.repository, "target.repository")?,
                digest: required(data.target.digest, "target.digest")?,
                source_host: required(data.request.host, "request.host")?,
            })
        } else {
            ReplicationEvent::Unrecognized {
                event_type: event_type.clone(),
            }
        };

        Ok(DecodedEvent {
            id: envelope.id,
            event_type,
            event_time: envelope.event_time,
            event,
        })
    }
}

/// Matches the fully qualified type or its short name (`ImagePushed`).
fn is_type(event_type: &str, qualified: &str) -> bool {
    let short = qualified.rsplit('.').next().unwrap_or(qualified);
    event_type.eq_ignore_ascii_case(qualified) || event_type.eq_ignore_ascii_case(short)
}

fn image_data(event_type: &str, data: Value) -> Result<RawImageData> {
    if data.is_null() {
        return Err(Error::decode(format!("'{event_type}' event has no data")));
    }
    serde_json::from_value(data)
        .map_err(|e| Error::decode(format!("'{event_type}' event data is malformed: {e}")))
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::decode(format!("event data is missing '{field}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn push_json() -> Value {
        json!({
            "id": "evt-1",
            "subject": "app:v2",
            "eventType": "Microsoft.ContainerRegistry.ImagePushed",
            "eventTime": "2024-05-01T10:00:00.1234567Z",
            "data": {
                "action": "push",
                "target": {
                    "mediaType": "application/vnd.docker.distribution.manifest.v2+json",
                    "digest": "sha256:abc",
                    "repository": "app",
                    "tag": "v2"
                },
                "request": { "host": "src.azurecr.io", "method": "PUT" }
            },
            "dataVersion": "1.0"
        })
    }

    #[test]
    fn test_decode_push() {
        let decoded = EventDecoder::decode(&push_json().to_string()).unwrap();
        assert_eq!(decoded.id.as_deref(), Some("evt-1"));
        assert!(decoded.event_time.is_some());
        assert_eq!(
            decoded.event,
            ReplicationEvent::Pushed(PushPayload {
                repository: "app".to_string(),
                tag: "v2".to_string(),
                source_host: "src.azurecr.io".to_string(),
            })
        );
    }

    #[test]
    fn test_decode_push_with_unparseable_time() {
        let raw = json!({
            "eventType": "ImagePushed",
            "eventTime": "yesterday",
            "data": {
                "target": { "repository": "app", "tag": "v2" },
                "request": { "host": "src.azurecr.io" }
            }
        });
        let decoded = EventDecoder::decode(&raw.to_string()).unwrap();
        assert_eq!(decoded.event_time, None);
        assert_eq!(decoded.event.kind(), "pushed");

        let raw = json!({
            "type": "ImageDeleted",
            "time": 1_700_000_000,
            "data": {
                "target": { "repository": "app", "digest": "sha256:abc" },
                "request": { "host": "src.azurecr.io" }
            }
        });
        let decoded = EventDecoder::decode(&raw.to_string()).unwrap();
        assert_eq!(decoded.event_time, None);
        assert_eq!(decoded.event.kind(), "deleted");
    }

    #[test]
    fn test_push_image_reference() {
        let push = PushPayload {
            repository: "team/app".to_string(),
            tag: "1.0.0".to_string(),
            source_host: "src.azurecr.io".to_string(),
        };
        assert_eq!(push.image_reference(), "team/app:1.0.0");
    }

    #[test]
    fn test_decode_delete_uses_digest_even_with_tag() {
        let raw = json!({
            "eventType": "ImageDeleted",
            "data": {
                "target": { "repository": "app", "tag": "v2", "digest": "sha256:abc" },
                "request": { "host": "src.azurecr.io" }
            }
        });
        let decoded = EventDecoder::decode(&raw.to_string()).unwrap();
        assert_eq!(
            decoded.event,
            ReplicationEvent::Deleted(DeletePayload {
                repository: "app".to_string(),
                digest: "sha256:abc".to_string(),
                source_host: "src.azurecr.io".to_string(),
            })
        );
    }

    #[test]
    fn test_decode_short_and_cloud_event_names() {
        let raw = json!({
            "specversion": "1.0",
            "type": "ImagePushed",
            "time": "2024-05-01T10:00:00Z",
            "data": {
                "target": { "repository": "app", "tag": "v2" },
                "request": { "host": "src.azurecr.io" }
            }
        });
        let decoded = EventDecoder::decode(&raw.to_string()).unwrap();
        assert_eq!(decoded.event.kind(), "pushed");
        assert!(decoded.event_time.is_some());
    }

    #[test]
    fn test_decode_unrecognized_keeps_type() {
        let raw = json!({
            "eventType": "Microsoft.ContainerRegistry.ChartPushed",
            "data": { "target": { "repository": "chart" } }
        });
        let decoded = EventDecoder::decode(&raw.to_string()).unwrap();
        assert_eq!(
            decoded.event,
            ReplicationEvent::Unrecognized {
                event_type: "Microsoft.ContainerRegistry.ChartPushed".to_string()
            }
        );
    }

    #[test]
    fn test_decode_single_element_batch() {
        let raw = Value::Array(vec![push_json()]).to_string();
        assert_eq!(EventDecoder::decode(&raw).unwrap().event.kind(), "pushed");
    }

    #[test]
    fn test_decode_rejects_multi_event_batch() {
        let raw = Value::Array(vec![push_json(), push_json()]).to_string();
        let err = EventDecoder::decode(&raw).unwrap_err();
        assert!(err.to_string().contains("batch of 2"));
    }

    #[test]
    fn test_decode_empty_and_garbage() {
        assert!(matches!(EventDecoder::decode(""), Err(Error::Decode { .. })));
        assert!(matches!(EventDecoder::decode("  \n"), Err(Error::Decode { .. })));
        assert!(matches!(EventDecoder::decode("{not json"), Err(Error::Decode { .. })));
        assert!(matches!(EventDecoder::decode("42"), Err(Error::Decode { .. })));
        assert!(matches!(
            EventDecoder::decode(r#"{"data": {}}"#),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn test_decode_push_without_tag_fails() {
        let raw = json!({
            "eventType": IMAGE_PUSHED,
            "data": {
                "target": { "repository": "app", "digest": "sha256:abc" },
                "request": { "host": "src.azurecr.io" }
            }
        });
        let err = EventDecoder::decode(&raw.to_string()).unwrap_err();
        assert!(err.to_string().contains("target.tag"));
    }

    #[test]
    fn test_decode_push_without_data_fails() {
        let raw = json!({ "eventType": IMAGE_PUSHED });
        let err = EventDecoder::decode(&raw.to_string()).unwrap_err();
        assert!(err.to_string().contains("has no data"));
    }

    #[test]
    fn test_subscription_validation_code() {
        let value = json!({
            "id": "2d1781af",
            "eventType": SUBSCRIPTION_VALIDATION,
            "data": { "validationCode": "512d38b6-c7b8-40c8-89fe-f46f9e9622b6" }
        });
        let envelope = EventEnvelope::from_value(value).unwrap();
        assert_eq!(
            envelope.subscription_validation_code(),
            Some("512d38b6-c7b8-40c8-89fe-f46f9e9622b6")
        );

        let push = EventEnvelope::from_value(push_json()).unwrap();
        assert!(push.subscription_validation_code().is_none());
    }
}
