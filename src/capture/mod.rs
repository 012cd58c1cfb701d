//! Platform-side event capture
//!
//! This module observes the platform's lifecycle notifications and forwards
//! normalized, authenticated events to the sync server. It never blocks or
//! fails the platform operation it is observing: delivery is fire-and-forget
//! and every failure degrades to a log line.

mod cache;
mod delivery;
mod hooks;

pub use cache::{CachedWorkflow, WorkflowCache};
pub use delivery::DeliveryClient;
pub use hooks::{CaptureHooks, VOLATILE_FIELDS, clean_workflow};
