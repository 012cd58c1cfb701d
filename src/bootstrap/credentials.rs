//! Credential materialization from the manifest
//!
//! Turns manifest entries into live credential rows. The two manifest
//! sections carry different skip semantics: a legacy env-mapping entry is
//! all-or-nothing, while a placeholder entry resolves field by field and is
//! only skipped when nothing resolves. Upserts key on `(name, type)` so
//! repeated runs update rather than duplicate. Per-credential failures are
//! logged and counted, never fatal.

use super::PlatformDb;
use crate::cipher::Cipher;
use crate::manifest::Manifest;
use crate::resolver::{self, Resolved};
use serde_json::{Map, Value};

/// Outcome counters for one materialization pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Upsert every resolvable manifest entry into the platform store
pub async fn materialize(
    db: &PlatformDb,
    cipher: &Cipher,
    manifest: &Manifest,
) -> eyre::Result<MaterializeSummary> {
    let project_id = db.first_project_id().await?;
    if project_id.is_none() {
        log::warn!("no project found, credentials will not be shared");
    }

    let mut summary = MaterializeSummary::default();

    let definitions = manifest.credentials.entries();
    if !definitions.is_empty() {
        log::info!("found {} credential(s) in user section", definitions.len());
    }
    for definition in definitions {
        log::info!("processing: {} ({})", definition.name, definition.r#type);

        let mut data = Map::new();
        let mut missing = Vec::new();
        for (field, env_name) in &definition.env_mapping {
            match std::env::var(env_name) {
                Ok(value) if !value.is_empty() => {
                    data.insert(field.clone(), resolver::coerce(&value));
                }
                _ => missing.push(env_name.clone()),
            }
        }

        // Legacy entries are all-or-nothing: a partial credential is worse
        // than an absent one.
        if !missing.is_empty() {
            log::info!("skipped {}: missing env vars: {}", definition.name, missing.join(", "));
            summary.skipped += 1;
            continue;
        }

        upsert_credential(
            db,
            cipher,
            &definition.name,
            &definition.r#type,
            &data,
            project_id.as_deref(),
            &mut summary,
        )
        .await;
    }

    if !manifest.auto_credentials.is_empty() {
        log::info!(
            "found {} credential(s) in auto-maintained section",
            manifest.auto_credentials.len()
        );
    }
    for credential in manifest.auto_credentials.values() {
        log::info!("processing: {} ({})", credential.name, credential.r#type);

        let mut data = Map::new();
        let mut missing = Vec::new();
        for (field, value) in &credential.data {
            match resolver::resolve(value) {
                Resolved::Value(Value::Null) => {}
                Resolved::Value(resolved) => {
                    data.insert(field.clone(), resolved);
                }
                Resolved::Missing(env_name) => missing.push(env_name),
            }
        }

        if !missing.is_empty() {
            log::info!(
                "omitting unresolved field(s) for {}: {}",
                credential.name,
                missing.join(", ")
            );
        }
        if data.is_empty() {
            log::info!("skipped {}: no env vars resolved", credential.name);
            summary.skipped += 1;
            continue;
        }

        upsert_credential(
            db,
            cipher,
            &credential.name,
            &credential.r#type,
            &data,
            project_id.as_deref(),
            &mut summary,
        )
        .await;
    }

    Ok(summary)
}

/// Encrypt and upsert one credential by `(name, type)`.
///
/// Errors are logged and absorbed; the entry counts as neither created nor
/// updated and the pass moves on.
async fn upsert_credential(
    db: &PlatformDb,
    cipher: &Cipher,
    name: &str,
    r#type: &str,
    data: &Map<String, Value>,
    project_id: Option<&str>,
    summary: &mut MaterializeSummary,
) {
    let encrypted = match cipher.encrypt(data) {
        Ok(encrypted) => encrypted,
        Err(e) => {
            log::error!("failed to encrypt {name}: {e}");
            return;
        }
    };

    let now = chrono::Utc::now();
    match db.find_credential_id(name, r#type).await {
        Ok(Some(credential_id)) => {
            match db.update_credential_data(&credential_id, &encrypted, now).await {
                Ok(()) => {
                    log::info!("updated: {name}");
                    summary.updated += 1;
                }
                Err(e) => log::error!("failed to update {name}: {e}"),
            }
        }
        Ok(None) => {
            let credential_id = uuid::Uuid::new_v4().to_string();
            match db
                .insert_credential(&credential_id, name, r#type, &encrypted, now)
                .await
            {
                Ok(()) => {
                    if let Some(project_id) = project_id
                        && let Err(e) = db.share_credential(&credential_id, project_id, now).await
                    {
                        log::error!("failed to share {name} with project {project_id}: {e}");
                    }
                    log::info!("created: {name}");
                    summary.created += 1;
                }
                Err(e) => log::error!("failed to create {name}: {e}"),
            }
        }
        Err(e) => log::error!("failed to look up {name}: {e}"),
    }
}
