//! Normalized event payloads
//!
//! Tagged payload types exchanged between the capture adapter and the sync
//! server, one per webhook endpoint. Field names follow the platform's
//! camelCase convention on the wire. Validation runs at the server boundary
//! before any I/O.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Workflow lifecycle event kinds the platform notifies about.
///
/// Archive/unarchive transitions fire no notification; the file
/// representation can drift for those until the next save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowEventKind {
    Update,
    Activate,
    Deactivate,
    AfterDelete,
}

impl std::fmt::Display for WorkflowEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Update => write!(f, "update"),
            Self::Activate => write!(f, "activate"),
            Self::Deactivate => write!(f, "deactivate"),
            Self::AfterDelete => write!(f, "afterDelete"),
        }
    }
}

/// Credential lifecycle event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CredentialEventKind {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for CredentialEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Workflow save notification: the volatile-stripped document plus identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSavePayload {
    /// Cleaned workflow document (volatile fields already stripped)
    pub workflow: Value,
    /// The workflow's name at event time, used for path derivation
    pub original_name: String,
    /// The platform's stable workflow identifier, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    /// Folder hierarchy path, `None` for root-level workflows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<String>,
    pub event: WorkflowEventKind,
}

impl WorkflowSavePayload {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.workflow.is_object() {
            return Err("missing workflow data");
        }
        if self.original_name.is_empty() {
            return Err("missing originalName");
        }
        Ok(())
    }
}

/// Workflow delete notification.
///
/// The platform only supplies the stable identifier; the adapter adds a
/// name recovered from its cache when it has one, for the fallback path
/// match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDeletePayload {
    pub workflow_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_name: Option<String>,
    pub event: WorkflowEventKind,
}

impl WorkflowDeletePayload {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.workflow_id.is_empty() {
            return Err("missing workflowId");
        }
        Ok(())
    }
}

/// Credential save notification. Carries identity only, never field values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSavePayload {
    /// The platform does not supply an id on every create notification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub r#type: String,
    pub event: CredentialEventKind,
}

impl CredentialSavePayload {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.is_empty() || self.r#type.is_empty() {
            return Err("missing credential data");
        }
        Ok(())
    }
}

/// Credential delete notification
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDeletePayload {
    pub id: String,
    pub event: CredentialEventKind,
}

impl CredentialDeletePayload {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.id.is_empty() {
            return Err("missing credential id");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_kind_wire_format() {
        assert_eq!(
            serde_json::to_string(&WorkflowEventKind::AfterDelete).unwrap(),
            "\"afterDelete\""
        );
        assert_eq!(
            serde_json::to_string(&CredentialEventKind::Create).unwrap(),
            "\"create\""
        );
    }

    #[test]
    fn test_workflow_save_payload_wire_format() {
        let payload = WorkflowSavePayload {
            workflow: json!({"name": "My Flow", "nodes": []}),
            original_name: "My Flow".to_string(),
            workflow_id: Some("wf-1".to_string()),
            folder_path: None,
            event: WorkflowEventKind::Update,
        };
        let wire = serde_json::to_value(&payload).unwrap();
        assert_eq!(wire["originalName"], "My Flow");
        assert_eq!(wire["workflowId"], "wf-1");
        assert_eq!(wire["event"], "update");
        assert!(wire.get("folderPath").is_none());
    }

    #[test]
    fn test_workflow_save_payload_validation() {
        let mut payload = WorkflowSavePayload {
            workflow: json!({"name": "My Flow"}),
            original_name: "My Flow".to_string(),
            workflow_id: None,
            folder_path: None,
            event: WorkflowEventKind::Update,
        };
        assert!(payload.validate().is_ok());

        payload.original_name = String::new();
        assert!(payload.validate().is_err());

        payload.original_name = "My Flow".to_string();
        payload.workflow = Value::Null;
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_credential_payload_validation() {
        let payload = CredentialSavePayload {
            id: None,
            name: "Slack Bot".to_string(),
            r#type: "slackApi".to_string(),
            event: CredentialEventKind::Create,
        };
        assert!(payload.validate().is_ok());

        let missing_type = CredentialSavePayload {
            r#type: String::new(),
            ..payload
        };
        assert!(missing_type.validate().is_err());

        let delete = CredentialDeletePayload {
            id: String::new(),
            event: CredentialEventKind::Delete,
        };
        assert!(delete.validate().is_err());
    }
}
