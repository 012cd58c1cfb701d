//! In-memory workflow identity cache
//!
//! Delete notifications carry only the stable identifier, so save events
//! record `id -> name` here to recover a name for logging and the fallback
//! path match. Process-lifetime, no eviction; losing it on restart is fine
//! because the primary delete match is the identifier embedded in the file
//! itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// What a later delete needs to know about a workflow
#[derive(Debug, Clone, PartialEq)]
pub struct CachedWorkflow {
    pub name: String,
    pub folder_path: Option<String>,
}

/// Shared `workflowId -> CachedWorkflow` lookup table.
///
/// An injected component rather than process-global state, so tests can
/// seed and inspect it directly.
#[derive(Debug, Clone, Default)]
pub struct WorkflowCache {
    inner: Arc<Mutex<HashMap<String, CachedWorkflow>>>,
}

impl WorkflowCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, workflow_id: impl Into<String>, entry: CachedWorkflow) {
        self.inner.lock().unwrap().insert(workflow_id.into(), entry);
    }

    pub fn get(&self, workflow_id: &str) -> Option<CachedWorkflow> {
        self.inner.lock().unwrap().get(workflow_id).cloned()
    }

    /// Remove and return the entry for a deleted workflow
    pub fn remove(&self, workflow_id: &str) -> Option<CachedWorkflow> {
        self.inner.lock().unwrap().remove(workflow_id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}
