//! Credential manifest reconciliation (capture path)
//!
//! Applies credential save/delete events to the auto-maintained manifest
//! section. Entries are keyed by sanitized name; deletes match on the
//! stored platform id, which survives renames. Field values written here
//! are always `${ENV_VAR}` placeholders; an existing non-empty value is
//! never overwritten, so user-customized placeholder names and literal
//! overrides survive later automated saves.

use crate::identity;
use crate::manifest::{AutoCredential, Manifest, manifest_path};
use crate::schema::SchemaClient;
use eyre::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Applies credential events to the manifest file
pub struct CredentialReconciler {
    base_dir: PathBuf,
    schema: SchemaClient,
}

impl CredentialReconciler {
    pub fn new(base_dir: impl AsRef<Path>, schema: SchemaClient) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            schema,
        }
    }

    /// Merge a credential save event into the manifest.
    ///
    /// Fetches the type's field names, keeps any existing non-empty value,
    /// synthesizes placeholders for new fields, and writes the entry back
    /// under its sanitized key. A failed schema fetch keeps the existing
    /// field set untouched rather than pruning it.
    pub async fn apply_save(
        &self,
        id: Option<&str>,
        name: &str,
        credential_type: &str,
    ) -> Result<String> {
        let fields = self.schema.fetch_fields(credential_type).await;

        let path = manifest_path(&self.base_dir);
        let mut manifest = Manifest::read(&path)?;
        let key = identity::credential_key(name);

        let existing = manifest.get_auto(&key);
        let existing_data = existing.map(|entry| entry.data.clone()).unwrap_or_default();
        let existing_id = existing.and_then(|entry| entry.id.clone());

        // A rename changes the sanitized key; the entry the old name left
        // behind still carries this id and would shadow future deletes.
        if let Some(id) = id
            && let Some(stale_key) = manifest
                .auto_credentials
                .iter()
                .find(|(existing_key, entry)| {
                    *existing_key != &key && entry.id.as_deref() == Some(id)
                })
                .map(|(existing_key, _)| existing_key.clone())
        {
            log::info!("credential {id} renamed, dropping stale entry {stale_key}");
            manifest.auto_credentials.remove(&stale_key);
        }

        let data = if fields.is_empty() {
            existing_data
        } else {
            let mut merged = BTreeMap::new();
            for field in &fields {
                match existing_data.get(field) {
                    Some(value) if !is_empty_value(value) => {
                        merged.insert(field.clone(), value.clone());
                    }
                    _ => {
                        let env_name = identity::env_var_name(name, field);
                        merged.insert(
                            field.clone(),
                            serde_yaml::Value::String(format!("${{{env_name}}}")),
                        );
                    }
                }
            }
            merged
        };

        manifest.upsert_auto(
            key.clone(),
            AutoCredential {
                // A create notification may lack the id; a previously stored
                // one still matches future deletes.
                id: id.map(str::to_string).or(existing_id),
                name: name.to_string(),
                r#type: credential_type.to_string(),
                data,
            },
        );
        manifest.write(&path)?;
        log::info!("manifest updated for credential {name} ({key})");
        Ok(key)
    }

    /// Remove the manifest entry whose stored id matches.
    ///
    /// Returns whether an entry was removed; not-found is non-fatal.
    pub fn apply_delete(&self, credential_id: &str) -> Result<bool> {
        let path = manifest_path(&self.base_dir);
        let mut manifest = Manifest::read(&path)?;

        match manifest.remove_auto_by_id(credential_id) {
            Some(key) => {
                manifest.write(&path)?;
                log::info!("removed credential {credential_id} ({key}) from manifest");
                Ok(true)
            }
            None => {
                log::warn!("credential not found in manifest: {credential_id}");
                Ok(false)
            }
        }
    }
}

fn is_empty_value(value: &serde_yaml::Value) -> bool {
    match value {
        serde_yaml::Value::Null => true,
        serde_yaml::Value::String(s) => s.is_empty(),
        _ => false,
    }
}
