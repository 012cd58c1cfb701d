//! Credential manifest management
//!
//! The manifest is stored as `credentials/manifest.yml` and has two
//! independent containers: a user-authored `credentials` section with
//! explicit environment mappings, and an auto-maintained `_autoCredentials`
//! section written by the capture path. The two are reconciled independently
//! and never overwrite each other's entries.
//!
//! Example format:
//! ```yaml
//! credentials:
//!   - name: Production Postgres
//!     type: postgres
//!     env_mapping:
//!       host: PG_HOST
//!       password: PG_PASSWORD
//! _autoCredentials:
//!   slack_bot:
//!     id: cred-123
//!     name: Slack Bot
//!     type: slackApi
//!     data:
//!       accessToken: ${SLACK_BOT_ACCESS_TOKEN}
//! ```

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Path of the manifest file under a base directory
pub fn manifest_path(base_dir: &Path) -> PathBuf {
    base_dir.join("credentials").join("manifest.yml")
}

/// A user-authored credential definition with explicit env mappings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CredentialDefinition {
    pub name: String,
    pub r#type: String,
    /// field name -> environment variable supplying its value
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env_mapping: BTreeMap<String, String>,
}

/// The user-authored `credentials` container.
///
/// Accepts both the array form and an object keyed by name; the capture
/// path never writes to this section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum UserCredentials {
    List(Vec<CredentialDefinition>),
    Named(BTreeMap<String, CredentialDefinition>),
}

impl UserCredentials {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::List(list) => list.is_empty(),
            Self::Named(map) => map.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::List(list) => list.len(),
            Self::Named(map) => map.len(),
        }
    }

    /// Iterate definitions regardless of container form
    pub fn entries(&self) -> Vec<&CredentialDefinition> {
        match self {
            Self::List(list) => list.iter().collect(),
            Self::Named(map) => map.values().collect(),
        }
    }
}

impl Default for UserCredentials {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

/// An auto-maintained credential entry, keyed by sanitized name.
///
/// `data` values are `${ENV_VAR}` placeholders unless a user manually
/// replaced one with a literal; secret values are never written here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutoCredential {
    /// The platform's stable credential identifier, when known. The only
    /// reliable key for delete matching; names can change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub r#type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, serde_yaml::Value>,
}

/// Credential manifest with user-authored and auto-maintained sections
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "UserCredentials::is_empty")]
    pub credentials: UserCredentials,
    #[serde(
        rename = "_autoCredentials",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub auto_credentials: BTreeMap<String, AutoCredential>,
}

impl Manifest {
    /// Read the manifest from a YAML file.
    ///
    /// An absent file is not an error and yields an empty manifest.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credential manifest: {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let manifest: Self = serde_yaml::from_str(&content)
            .with_context(|| "Failed to parse credential manifest YAML")?;
        Ok(manifest)
    }

    /// Write the manifest to a YAML file, creating parent directories
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)
            .with_context(|| "Failed to serialize credential manifest to YAML")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write credential manifest: {}", path.display()))?;
        Ok(())
    }

    /// Insert or replace an auto-maintained entry under its sanitized key
    pub fn upsert_auto(&mut self, key: impl Into<String>, entry: AutoCredential) {
        self.auto_credentials.insert(key.into(), entry);
    }

    /// Get an auto-maintained entry by sanitized key
    pub fn get_auto(&self, key: &str) -> Option<&AutoCredential> {
        self.auto_credentials.get(key)
    }

    /// Remove the auto-maintained entry whose stored platform id matches.
    ///
    /// Returns the removed key, or `None` when no entry carries that id.
    pub fn remove_auto_by_id(&mut self, credential_id: &str) -> Option<String> {
        let key = self
            .auto_credentials
            .iter()
            .find(|(_, entry)| entry.id.as_deref() == Some(credential_id))
            .map(|(key, _)| key.clone())?;
        self.auto_credentials.remove(&key);
        Some(key)
    }
}
