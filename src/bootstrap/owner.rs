//! Owner account and service API key provisioning
//!
//! The owner user is created at most once, checked by email uniqueness.
//! The setup flag and the shared API key file are refreshed on every run so
//! a restarted deployment always comes up ready.

use super::PlatformDb;
use crate::config::BootstrapConfig;
use crate::schema;
use argon2::Argon2;
use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};
use eyre::{Result, eyre};
use rand::RngCore;
use std::path::Path;

/// Fixed row id for the service API key; the existence check that keeps
/// repeated bootstraps from minting new keys
pub const SERVICE_API_KEY_ID: &str = "sync-service-key";

/// Ensure the privileged account, setup flag, and service API key exist.
///
/// Skipped entirely (returning `None`) when the owner email or password is
/// not configured.
pub async fn ensure_owner(db: &PlatformDb, config: &BootstrapConfig) -> Result<Option<String>> {
    let (Some(email), Some(password)) = (&config.owner_email, &config.owner_password) else {
        log::info!("owner account setup skipped (OWNER_EMAIL or OWNER_PASSWORD not set)");
        return Ok(None);
    };

    log::info!("setting up owner account: {email}");

    let user_id = match db.find_user_id_by_email(email).await? {
        Some(id) => {
            log::info!("owner account already exists");
            id
        }
        None => {
            let user_id = uuid::Uuid::new_v4().to_string();
            let now = chrono::Utc::now();
            db.insert_owner_user(&user_id, email, &hash_password(password)?, now)
                .await?;
            log::info!("created owner user");

            let project_id = uuid::Uuid::new_v4().to_string();
            db.insert_personal_project(&project_id, "Admin User", &user_id, now)
                .await?;
            db.insert_project_relation(&project_id, &user_id, now).await?;
            log::info!("created personal project and ownership link");
            user_id
        }
    };

    db.mark_setup_complete().await?;
    ensure_service_api_key(db, &user_id, &config.base_dir).await?;

    Ok(Some(user_id))
}

/// Hash an owner password with argon2id at default parameters
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| eyre!("Failed to hash owner password: {e}"))
}

/// Create or reuse the service API key and rewrite the shared key file.
///
/// The file is rewritten on every run so other components always find a
/// valid key after a restart.
async fn ensure_service_api_key(db: &PlatformDb, user_id: &str, base_dir: &Path) -> Result<()> {
    let api_key = match db.find_api_key(SERVICE_API_KEY_ID).await? {
        Some(api_key) => {
            log::info!("service api key already exists");
            api_key
        }
        None => {
            let api_key = generate_api_key();
            db.insert_api_key(
                SERVICE_API_KEY_ID,
                user_id,
                "sync-service",
                &api_key,
                chrono::Utc::now(),
            )
            .await?;
            log::info!("created service api key");
            api_key
        }
    };

    let key_path = schema::api_key_path(base_dir);
    if let Some(parent) = key_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&key_path, format!("{api_key}\n"))?;
    log::info!("service api key written to {}", key_path.display());
    Ok(())
}

fn generate_api_key() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("svc_api_{hex}")
}
