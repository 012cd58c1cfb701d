//! One-shot bootstrap reconciler
//!
//! Runs at provisioning time directly against the platform's store: owner
//! account first, then credential materialization from the manifest. Safe
//! to re-run; every create path checks for an existing row by a stable key
//! before inserting. Only a failed connection or a missing encryption key
//! aborts the pass.

mod credentials;
mod db;
mod owner;

pub use credentials::MaterializeSummary;
pub use db::PlatformDb;
pub use owner::{SERVICE_API_KEY_ID, ensure_owner, hash_password};

use crate::cipher::Cipher;
use crate::config::{BootstrapConfig, DbConfig};
use crate::manifest::{Manifest, manifest_path};
use eyre::{Result, eyre};

/// Run the full bootstrap pass
pub async fn run(config: BootstrapConfig, db_config: DbConfig) -> Result<()> {
    log::info!("bootstrap starting");
    let db = PlatformDb::connect(&db_config.url()).await?;

    owner::ensure_owner(&db, &config).await?;

    let manifest_file = config
        .manifest
        .clone()
        .unwrap_or_else(|| manifest_path(&config.base_dir));
    if !manifest_file.exists() {
        log::info!(
            "no manifest found at {}, skipping credential bootstrap",
            manifest_file.display()
        );
        db.close().await;
        return Ok(());
    }

    // Fatal before any credential work: without the deployment key nothing
    // can be stored.
    let encryption_key = config
        .encryption_key
        .clone()
        .ok_or_else(|| eyre!("ENCRYPTION_KEY is required for credential encryption"))?;
    let cipher = Cipher::new(encryption_key);

    let manifest = Manifest::read(&manifest_file)?;
    let summary = credentials::materialize(&db, &cipher, &manifest).await?;
    log::info!(
        "bootstrap complete: created {}, updated {}, skipped {}",
        summary.created,
        summary.updated,
        summary.skipped
    );

    db.close().await;
    Ok(())
}
