//! Flowsync
//!
//! Bidirectional sync between an automation platform's live state and a
//! versionable, secret-free file representation. The capture path turns
//! platform change notifications into idempotent file writes keyed by
//! stable identity; the bootstrap path re-seeds a fresh deployment from the
//! declarative manifest plus environment-supplied secrets.

pub mod bootstrap;
pub mod capture;
pub mod cipher;
pub mod config;
pub mod events;
pub mod identity;
pub mod manifest;
pub mod reconcile;
pub mod resolver;
pub mod schema;
pub mod server;
pub mod workflows;

// Re-exports for convenience
pub use capture::{CaptureHooks, DeliveryClient, WorkflowCache};
pub use cipher::Cipher;
pub use config::{BootstrapConfig, CaptureConfig, DbConfig, ServerConfig};
pub use manifest::{AutoCredential, CredentialDefinition, Manifest};
pub use reconcile::CredentialReconciler;
pub use schema::SchemaClient;
pub use workflows::WorkflowStore;
