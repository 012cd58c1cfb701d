//! Workflow file persistence keyed by stable identity
//!
//! Workflow files are pretty-printed JSON under `{base_dir}/workflows/`,
//! optionally nested by folder hierarchy. Every file carries an embedded
//! identifier so later deletions and renames resolve by identity rather
//! than by name alone; the platform never interprets the field and it is
//! stripped again before any re-import.

use crate::identity;
use eyre::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Field embedded in each workflow file holding the platform's stable
/// workflow identifier
pub const SYNC_ID_FIELD: &str = "_syncId";

/// Writes, locates, and deletes workflow files under a base directory
#[derive(Debug, Clone)]
pub struct WorkflowStore {
    base_dir: PathBuf,
}

impl WorkflowStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    fn workflows_dir(&self) -> PathBuf {
        self.base_dir.join(identity::WORKFLOWS_DIR)
    }

    /// Persist a workflow document to its canonical path.
    ///
    /// Embeds the stable identifier when one is known, and relocates the
    /// file when a previous save under the same identifier lives at a
    /// different path (rename or folder move).
    pub fn save(
        &self,
        workflow: &Value,
        name: &str,
        workflow_id: Option<&str>,
        folder_path: Option<&str>,
    ) -> Result<PathBuf> {
        let path = identity::workflow_file_path(&self.base_dir, name, folder_path);

        // A rename or folder move leaves the previous file behind; the
        // embedded identifier is the only way to find it.
        if let Some(id) = workflow_id
            && let Some(stale) = self.find_by_sync_id(id)?
            && stale != path
        {
            log::info!(
                "relocating workflow {}: {} -> {}",
                id,
                stale.display(),
                path.display()
            );
            std::fs::remove_file(&stale)
                .with_context(|| format!("Failed to remove stale workflow file: {}", stale.display()))?;
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut document = workflow.clone();
        if let (Some(object), Some(id)) = (document.as_object_mut(), workflow_id) {
            object.insert(SYNC_ID_FIELD.to_string(), Value::String(id.to_string()));
        }

        let mut json = serde_json::to_string_pretty(&document)?;
        json.push('\n');
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write workflow file: {}", path.display()))?;

        Ok(path)
    }

    /// Delete the file for a workflow, matching by embedded identifier
    /// first and by name-derived filename second.
    ///
    /// Returns the removed path, or `None` when no file matched (already
    /// absent is not an error).
    pub fn delete(&self, workflow_id: &str, name: Option<&str>) -> Result<Option<PathBuf>> {
        if let Some(path) = self.find_by_sync_id(workflow_id)? {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to delete workflow file: {}", path.display()))?;
            return Ok(Some(path));
        }

        // Files written before the identifier existed, or externally, only
        // match by name.
        if let Some(name) = name {
            let filename = format!("{}.json", identity::slug(name));
            if let Some(path) = self.find_by_filename(&filename)? {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to delete workflow file: {}", path.display()))?;
                return Ok(Some(path));
            }
        }

        Ok(None)
    }

    /// Scan the workflow root for a file whose embedded identifier matches
    pub fn find_by_sync_id(&self, workflow_id: &str) -> Result<Option<PathBuf>> {
        for path in self.json_files()? {
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    log::debug!("skipping unreadable file {}: {}", path.display(), e);
                    continue;
                }
            };
            let document: Value = match serde_json::from_str(&content) {
                Ok(document) => document,
                Err(e) => {
                    log::debug!("skipping unparseable file {}: {}", path.display(), e);
                    continue;
                }
            };
            if document.get(SYNC_ID_FIELD).and_then(Value::as_str) == Some(workflow_id) {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    fn find_by_filename(&self, filename: &str) -> Result<Option<PathBuf>> {
        Ok(self
            .json_files()?
            .into_iter()
            .find(|path| path.file_name().and_then(|n| n.to_str()) == Some(filename)))
    }

    /// All JSON files under the workflow root, canonical path first
    fn json_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        collect_json_files(&self.workflows_dir(), &mut files)?;
        Ok(files)
    }
}

fn collect_json_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_json_files(&path, files)?;
        } else if path.extension().and_then(|s| s.to_str()) == Some("json") {
            files.push(path);
        }
    }
    Ok(())
}

/// Remove the embedded identifier from a workflow document read back for
/// re-import into the platform
pub fn strip_sync_id(document: &mut Value) {
    if let Some(object) = document.as_object_mut() {
        object.remove(SYNC_ID_FIELD);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn workflow() -> Value {
        json!({
            "name": "My Flow!",
            "nodes": [],
            "connections": {},
            "active": false
        })
    }

    #[test]
    fn test_save_writes_canonical_path() {
        let temp_dir = TempDir::new().unwrap();
        let store = WorkflowStore::new(temp_dir.path());

        let path = store.save(&workflow(), "My Flow!", Some("wf-1"), None).unwrap();
        assert!(path.ends_with("workflows/my-flow.json"));
        assert!(path.exists());

        let document: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(document[SYNC_ID_FIELD], "wf-1");
        assert_eq!(document["name"], "My Flow!");
    }

    #[test]
    fn test_save_nests_by_folder() {
        let temp_dir = TempDir::new().unwrap();
        let store = WorkflowStore::new(temp_dir.path());

        let path = store
            .save(&workflow(), "My Flow!", Some("wf-1"), Some("team/etl"))
            .unwrap();
        assert!(path.ends_with("workflows/team/etl/my-flow.json"));
        assert!(path.exists());
    }

    #[test]
    fn test_save_relocates_on_rename() {
        let temp_dir = TempDir::new().unwrap();
        let store = WorkflowStore::new(temp_dir.path());

        let old_path = store.save(&workflow(), "My Flow!", Some("wf-1"), None).unwrap();
        let new_path = store
            .save(&workflow(), "Renamed Flow", Some("wf-1"), None)
            .unwrap();

        assert!(!old_path.exists());
        assert!(new_path.exists());
        assert!(new_path.ends_with("workflows/renamed-flow.json"));
    }

    #[test]
    fn test_save_without_id_has_no_sync_field() {
        let temp_dir = TempDir::new().unwrap();
        let store = WorkflowStore::new(temp_dir.path());

        let path = store.save(&workflow(), "My Flow!", None, None).unwrap();
        let document: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(document.get(SYNC_ID_FIELD).is_none());
    }

    #[test]
    fn test_delete_by_sync_id_after_rename() {
        let temp_dir = TempDir::new().unwrap();
        let store = WorkflowStore::new(temp_dir.path());

        // File written under the old name; the delete only knows the id and
        // the new name.
        store.save(&workflow(), "My Flow!", Some("wf-1"), None).unwrap();
        let deleted = store.delete("wf-1", Some("Renamed Flow")).unwrap();

        assert!(deleted.is_some());
        assert!(deleted.unwrap().ends_with("workflows/my-flow.json"));
    }

    #[test]
    fn test_delete_falls_back_to_name() {
        let temp_dir = TempDir::new().unwrap();
        let store = WorkflowStore::new(temp_dir.path());

        // File written externally, no embedded identifier
        let dir = temp_dir.path().join("workflows/team");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("my-flow.json"),
            serde_json::to_string_pretty(&workflow()).unwrap(),
        )
        .unwrap();

        let deleted = store.delete("wf-unknown", Some("My Flow!")).unwrap();
        assert!(deleted.is_some());
        assert!(!dir.join("my-flow.json").exists());
    }

    #[test]
    fn test_delete_absent_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = WorkflowStore::new(temp_dir.path());

        assert_eq!(store.delete("wf-ghost", Some("Nothing Here")).unwrap(), None);
    }

    #[test]
    fn test_delete_skips_unparseable_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = WorkflowStore::new(temp_dir.path());

        let dir = temp_dir.path().join("workflows");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("broken.json"), "{ not json").unwrap();
        store.save(&workflow(), "My Flow!", Some("wf-1"), None).unwrap();

        let deleted = store.delete("wf-1", None).unwrap();
        assert!(deleted.is_some());
    }

    #[test]
    fn test_strip_sync_id() {
        let mut document = json!({ "name": "My Flow!", SYNC_ID_FIELD: "wf-1" });
        strip_sync_id(&mut document);
        assert!(document.get(SYNC_ID_FIELD).is_none());
    }
}
