//! Integration tests for credential manifest reconciliation against a stub
//! platform schema endpoint

use axum::routing::get;
use axum::{Json, Router, extract::Path as AxumPath};
use eyre::Result;
use flowsync::manifest::{Manifest, manifest_path};
use flowsync::reconcile::CredentialReconciler;
use flowsync::schema::{SchemaClient, api_key_path};
use serde_json::{Value, json};
use std::path::Path;
use tempfile::TempDir;
use url::Url;

/// Stub platform serving credential schemas for two known types
async fn start_stub_platform() -> Result<Url> {
    async fn schema(AxumPath(credential_type): AxumPath<String>) -> Json<Value> {
        match credential_type.as_str() {
            "slackApi" => Json(json!({
                "properties": {
                    "accessToken": { "type": "string" },
                    "signatureSecret": { "type": "string" }
                },
                "required": ["accessToken"]
            })),
            "httpBasicAuth" => Json(json!({
                "properties": {
                    "user": { "type": "string" },
                    "password": { "type": "string" }
                }
            })),
            _ => Json(json!({})),
        }
    }

    let router = Router::new().route("/api/v1/credentials/schema/{type}", get(schema));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Ok(Url::parse(&format!("http://{address}"))?)
}

fn write_api_key(base_dir: &Path) -> Result<()> {
    let key_path = api_key_path(base_dir);
    std::fs::create_dir_all(key_path.parent().unwrap())?;
    std::fs::write(&key_path, "svc_api_0123456789abcdef\n")?;
    Ok(())
}

#[tokio::test]
async fn test_save_synthesizes_placeholders_from_schema() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_api_key(temp_dir.path())?;
    let platform = start_stub_platform().await?;

    let schema = SchemaClient::try_new(platform, temp_dir.path())?;
    let reconciler = CredentialReconciler::new(temp_dir.path(), schema);

    reconciler.apply_save(Some("cred-1"), "Slack Bot", "slackApi").await?;

    let manifest = Manifest::read(manifest_path(temp_dir.path()))?;
    let entry = manifest.get_auto("slack_bot").unwrap();
    assert_eq!(entry.name, "Slack Bot");
    assert_eq!(
        entry.data.get("accessToken"),
        Some(&serde_yaml::Value::String("${SLACK_BOT_ACCESSTOKEN}".to_string()))
    );
    assert_eq!(
        entry.data.get("signatureSecret"),
        Some(&serde_yaml::Value::String("${SLACK_BOT_SIGNATURESECRET}".to_string()))
    );
    Ok(())
}

#[tokio::test]
async fn test_manual_edit_survives_automated_saves() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_api_key(temp_dir.path())?;
    let platform = start_stub_platform().await?;

    let schema = SchemaClient::try_new(platform, temp_dir.path())?;
    let reconciler = CredentialReconciler::new(temp_dir.path(), schema);

    // First automated save
    reconciler.apply_save(Some("cred-1"), "Slack Bot", "slackApi").await?;

    // User points one field at their own variable
    let path = manifest_path(temp_dir.path());
    let mut manifest = Manifest::read(&path)?;
    let mut entry = manifest.get_auto("slack_bot").unwrap().clone();
    entry.data.insert(
        "accessToken".to_string(),
        serde_yaml::Value::String("${MY_CUSTOM_TOKEN}".to_string()),
    );
    manifest.upsert_auto("slack_bot", entry);
    manifest.write(&path)?;

    // Second and third automated saves keep the edit
    reconciler.apply_save(Some("cred-1"), "Slack Bot", "slackApi").await?;
    reconciler.apply_save(Some("cred-1"), "Slack Bot", "slackApi").await?;

    let manifest = Manifest::read(&path)?;
    let entry = manifest.get_auto("slack_bot").unwrap();
    assert_eq!(
        entry.data.get("accessToken"),
        Some(&serde_yaml::Value::String("${MY_CUSTOM_TOKEN}".to_string()))
    );
    assert_eq!(
        entry.data.get("signatureSecret"),
        Some(&serde_yaml::Value::String("${SLACK_BOT_SIGNATURESECRET}".to_string()))
    );
    Ok(())
}

#[tokio::test]
async fn test_rename_updates_entry_and_delete_matches_by_id() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_api_key(temp_dir.path())?;
    let platform = start_stub_platform().await?;

    let schema = SchemaClient::try_new(platform, temp_dir.path())?;
    let reconciler = CredentialReconciler::new(temp_dir.path(), schema);

    reconciler.apply_save(Some("cred-1"), "Team Login", "httpBasicAuth").await?;
    // Renamed in the platform; new key, same stable id, old entry dropped
    reconciler.apply_save(Some("cred-1"), "Ops Login", "httpBasicAuth").await?;

    let manifest = Manifest::read(manifest_path(temp_dir.path()))?;
    assert!(manifest.get_auto("team_login").is_none());
    assert!(manifest.get_auto("ops_login").is_some());

    // Delete by id removes whichever key carries it
    assert!(reconciler.apply_delete("cred-1")?);
    let manifest = Manifest::read(manifest_path(temp_dir.path()))?;
    assert!(manifest.get_auto("ops_login").is_none());
    Ok(())
}

#[tokio::test]
async fn test_user_section_is_never_touched() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write_api_key(temp_dir.path())?;
    let platform = start_stub_platform().await?;

    // Seed a user-authored section
    let path = manifest_path(temp_dir.path());
    std::fs::create_dir_all(path.parent().unwrap())?;
    std::fs::write(
        &path,
        r#"credentials:
  - name: Production Postgres
    type: postgres
    env_mapping:
      host: PG_HOST
"#,
    )?;

    let schema = SchemaClient::try_new(platform, temp_dir.path())?;
    let reconciler = CredentialReconciler::new(temp_dir.path(), schema);
    reconciler.apply_save(Some("cred-1"), "Slack Bot", "slackApi").await?;
    assert!(reconciler.apply_delete("cred-1")?);

    let manifest = Manifest::read(&path)?;
    assert_eq!(manifest.credentials.len(), 1);
    assert_eq!(manifest.credentials.entries()[0].name, "Production Postgres");
    Ok(())
}
