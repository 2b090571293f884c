//! # acr-mirror replicator
//!
//! Keeps a target container registry in step with a source registry by
//! reacting to the source's lifecycle events:
//!
//! - **Image pushed**: the target imports `repository:tag` from the source
//!   with the configured pull token, overwriting the tag if present.
//! - **Image deleted**: the manifest with the same digest is deleted from the
//!   target.
//! - Anything else is logged and ignored.
//!
//! ```text
//!   source registry ──event──▶ Replicator ──decode──▶ ReplicationDispatcher
//!                                                     │              │
//!                                              ImportCommand   DeleteCommand
//!                                                     │              │
//!                                         management API      management API
//!                                          (importImage)    + data plane DELETE
//! ```
//!
//! Every event is one independent invocation. Configuration is validated per
//! invocation, credentials and clients are created fresh, and nothing is
//! retried internally: the event source redelivers on failure.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod delete;
pub mod dispatcher;
pub mod error;
pub mod import;
pub mod outcome;
pub mod replicator;

pub use context::TargetContext;
pub use delete::DeleteCommand;
pub use dispatcher::ReplicationDispatcher;
pub use error::{ReplicationError, Result};
pub use import::ImportCommand;
pub use outcome::Outcome;
pub use replicator::Replicator;
