//! # acr-mirror test
//!
//! Test support for acr-mirror:
//!
//! - [`MockRegistry`] - recording fake for the registry client seams
//! - [`fixtures`] - a valid configuration and source registry events
//!
//! ## Example
//!
//! ```rust
//! use acr_mirror_core::EventDecoder;
//! use acr_mirror_test::{fixtures, MockRegistry};
//!
//! let registry = MockRegistry::new();
//! let config = fixtures::valid_configuration();
//! let event = EventDecoder::decode_value(fixtures::push_event("app", "v2")).unwrap();
//! # let _ = (registry, config, event);
//! ```

pub mod fixtures;
pub mod mock_registry;

pub use fixtures::EventBuilder;
pub use mock_registry::{DeleteRecord, ImportRecord, MockRegistry, RegistryCall};
