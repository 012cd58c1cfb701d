//! Platform lifecycle hooks
//!
//! One handler per event kind, invoked synchronously by the platform's
//! plugin mechanism. Each handler normalizes its notification into a tagged
//! payload and hands it to the delivery client; nothing here can fail the
//! observed platform operation. Ordering only matters per workflow or
//! credential identity, not across them.

use super::{CachedWorkflow, DeliveryClient, WorkflowCache};
use crate::events::{
    CredentialDeletePayload, CredentialEventKind, CredentialSavePayload, WorkflowDeletePayload,
    WorkflowEventKind, WorkflowSavePayload,
};
use crate::identity;
use serde_json::Value;

/// Platform fields that change on every save or carry deployment-local
/// state; stripped before the document reaches the file representation.
pub const VOLATILE_FIELDS: &[&str] = &[
    "createdAt",
    "updatedAt",
    "versionId",
    "statistics",
    "staticData",
    "triggerCount",
    "versionCounter",
    "activeVersionId",
    "activeVersion",
    "shared",
    "homeProject",
    "sharedWithProjects",
    "parentFolder",
];

/// Strip volatile fields from a workflow document.
///
/// Also drops `meta.instanceId` (removing `meta` entirely once empty) and
/// the platform row id; identity travels separately in the payload.
pub fn clean_workflow(workflow: &Value) -> Value {
    let mut cleaned = workflow.clone();
    if let Some(object) = cleaned.as_object_mut() {
        for field in VOLATILE_FIELDS {
            object.remove(*field);
        }
        object.remove("id");
        let meta_empty = match object.get_mut("meta").and_then(Value::as_object_mut) {
            Some(meta) => {
                meta.remove("instanceId");
                meta.is_empty()
            }
            None => false,
        };
        if meta_empty {
            object.remove("meta");
        }
    }
    cleaned
}

/// Capture-side event handlers
pub struct CaptureHooks {
    delivery: DeliveryClient,
    cache: WorkflowCache,
}

impl CaptureHooks {
    pub fn new(delivery: DeliveryClient, cache: WorkflowCache) -> Self {
        Self { delivery, cache }
    }

    pub fn workflow_updated(&self, workflow: &Value) {
        self.handle_workflow_save(workflow, WorkflowEventKind::Update);
    }

    pub fn workflow_activated(&self, workflow: &Value) {
        self.handle_workflow_save(workflow, WorkflowEventKind::Activate);
    }

    pub fn workflow_deactivated(&self, workflow: &Value) {
        self.handle_workflow_save(workflow, WorkflowEventKind::Deactivate);
    }

    /// The delete notification carries only the stable identifier. A cache
    /// hit recovers the name for the fallback path match; the id-bearing
    /// payload is forwarded either way.
    pub fn workflow_deleted(&self, workflow_id: &str) {
        if workflow_id.is_empty() {
            log::debug!("skipping afterDelete: no workflow id");
            return;
        }
        let cached = self.cache.remove(workflow_id);
        match &cached {
            Some(entry) => log::info!("workflow afterDelete: {} ({})", entry.name, workflow_id),
            None => log::info!("workflow afterDelete: {} (name unknown)", workflow_id),
        }
        let payload = WorkflowDeletePayload {
            workflow_id: workflow_id.to_string(),
            workflow_name: cached.map(|entry| entry.name),
            event: WorkflowEventKind::AfterDelete,
        };
        self.delivery.send("/webhook/workflow-delete", &payload);
    }

    pub fn credential_created(&self, credential: &Value) {
        self.handle_credential_save(credential, CredentialEventKind::Create);
    }

    pub fn credential_updated(&self, credential: &Value) {
        self.handle_credential_save(credential, CredentialEventKind::Update);
    }

    pub fn credential_deleted(&self, credential_id: &str) {
        if credential_id.is_empty() {
            log::debug!("skipping credential delete: no id");
            return;
        }
        log::info!("credential delete: {}", credential_id);
        let payload = CredentialDeletePayload {
            id: credential_id.to_string(),
            event: CredentialEventKind::Delete,
        };
        self.delivery.send("/webhook/credential-delete", &payload);
    }

    fn handle_workflow_save(&self, workflow: &Value, event: WorkflowEventKind) {
        let Some(name) = workflow.get("name").and_then(Value::as_str) else {
            log::debug!("skipping {event}: workflow has no name");
            return;
        };
        let workflow_id = workflow.get("id").and_then(value_as_id);
        let folder_path = identity::folder_path_from_parents(workflow);

        if let Some(id) = &workflow_id {
            self.cache.insert(
                id.clone(),
                CachedWorkflow {
                    name: name.to_string(),
                    folder_path: folder_path.clone(),
                },
            );
        }

        log::info!(
            "workflow {}: {} id={} folder={}",
            event,
            name,
            workflow_id.as_deref().unwrap_or("?"),
            folder_path.as_deref().unwrap_or("root")
        );

        let payload = WorkflowSavePayload {
            workflow: clean_workflow(workflow),
            original_name: name.to_string(),
            workflow_id,
            folder_path,
            event,
        };
        self.delivery.send("/webhook/workflow-save", &payload);
    }

    fn handle_credential_save(&self, credential: &Value, event: CredentialEventKind) {
        let name = credential.get("name").and_then(Value::as_str);
        let r#type = credential.get("type").and_then(Value::as_str);
        let (Some(name), Some(r#type)) = (name, r#type) else {
            log::debug!("skipping credential {event}: missing name or type");
            return;
        };
        log::info!("credential {}: {} type={}", event, name, r#type);

        let payload = CredentialSavePayload {
            id: credential.get("id").and_then(value_as_id),
            name: name.to_string(),
            r#type: r#type.to_string(),
            event,
        };
        self.delivery.send("/webhook/credential-save", &payload);
    }
}

/// Platform ids arrive as strings or numbers depending on the entity
fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_workflow_strips_volatile_fields() {
        let workflow = json!({
            "id": "wf-1",
            "name": "My Flow",
            "nodes": [],
            "connections": {},
            "active": true,
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-02-01T00:00:00Z",
            "versionId": "v-9",
            "statistics": { "runs": 12 },
            "shared": [{ "role": "workflow:owner" }],
            "parentFolder": { "name": "team" }
        });

        let cleaned = clean_workflow(&workflow);
        let object = cleaned.as_object().unwrap();

        for field in VOLATILE_FIELDS {
            assert!(!object.contains_key(*field), "{field} should be stripped");
        }
        assert!(!object.contains_key("id"));
        assert_eq!(cleaned["name"], "My Flow");
        assert_eq!(cleaned["active"], true);
    }

    #[test]
    fn test_clean_workflow_drops_instance_id() {
        let workflow = json!({
            "name": "My Flow",
            "meta": { "instanceId": "abc123" }
        });
        let cleaned = clean_workflow(&workflow);
        assert!(cleaned.get("meta").is_none());

        let workflow = json!({
            "name": "My Flow",
            "meta": { "instanceId": "abc123", "templateId": "tmpl-1" }
        });
        let cleaned = clean_workflow(&workflow);
        assert_eq!(cleaned["meta"], json!({ "templateId": "tmpl-1" }));
    }

    #[test]
    fn test_value_as_id() {
        assert_eq!(value_as_id(&json!("wf-1")), Some("wf-1".to_string()));
        assert_eq!(value_as_id(&json!(42)), Some("42".to_string()));
        assert_eq!(value_as_id(&json!("")), None);
        assert_eq!(value_as_id(&json!(null)), None);
    }
}
