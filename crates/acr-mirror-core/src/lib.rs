//! # acr-mirror core
//!
//! Core types for mirroring container images between two registries in
//! response to source registry lifecycle events.
//!
//! This crate has no I/O. It provides:
//!
//! - [`Configuration`] - the seven settings an invocation needs, with [`Validate`]
//! - [`ResourceIdentifier`] - parsed target registry resource locator
//! - [`EventDecoder`] - raw event text to a [`ReplicationEvent`]
//!
//! ## Example
//!
//! ```rust
//! use acr_mirror_core::{EventDecoder, ReplicationEvent};
//!
//! let raw = r#"{
//!     "eventType": "Microsoft.ContainerRegistry.ImagePushed",
//!     "data": {
//!         "target": { "repository": "app", "tag": "v2" },
//!         "request": { "host": "src.azurecr.io" }
//!     }
//! }"#;
//!
//! let decoded = EventDecoder::decode(raw)?;
//! match decoded.event {
//!     ReplicationEvent::Pushed(push) => assert_eq!(push.image_reference(), "app:v2"),
//!     _ => unreachable!(),
//! }
//! # Ok::<(), acr_mirror_core::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;
pub mod resource_id;
pub mod validation;


pub use config::{keys, Configuration};
pub use error::{Error, Result};
pub use event::{
    DecodedEvent, DeletePayload, EventDecoder, EventEnvelope, PushPayload, ReplicationEvent,
};
pub use resource_id::ResourceIdentifier;
pub use validation::{Validate, ValidationError, ValidationErrors};
