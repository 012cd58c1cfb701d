//! Credential schema lookup
//!
//! Best-effort, authenticated lookup of a credential type's declared field
//! names from the live platform. Only names are ever fetched, never values.
//! Every failure mode degrades to an empty list; callers must treat empty
//! as "no known fields, do not prune or overwrite".

use eyre::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Path of the shared service API key file under a base directory
pub fn api_key_path(base_dir: &Path) -> PathBuf {
    base_dir.join("credentials").join(".service-api-key")
}

/// Client for the platform's credential schema endpoint
#[derive(Debug, Clone)]
pub struct SchemaClient {
    http: Client,
    platform_url: Url,
    api_key_path: PathBuf,
}

impl SchemaClient {
    pub fn try_new(platform_url: Url, base_dir: impl AsRef<Path>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build schema client")?;
        Ok(Self {
            http,
            platform_url,
            api_key_path: api_key_path(base_dir.as_ref()),
        })
    }

    /// Fetch the declared field names for a credential type.
    ///
    /// Returns an empty list on any failure: missing key file, network
    /// error, non-200 status, or unparseable body.
    pub async fn fetch_fields(&self, credential_type: &str) -> Vec<String> {
        let Some(api_key) = self.read_api_key() else {
            log::warn!("no service api key available, cannot fetch schema for {credential_type}");
            return Vec::new();
        };

        let url = match self
            .platform_url
            .join(&format!("api/v1/credentials/schema/{credential_type}"))
        {
            Ok(url) => url,
            Err(e) => {
                log::warn!("invalid schema url for {credential_type}: {e}");
                return Vec::new();
            }
        };
        log::debug!("fetching schema from {url}");

        let response = match self.http.get(url).header("x-api-key", api_key).send().await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("schema request for {credential_type} failed: {e}");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            log::warn!(
                "failed to fetch schema for {credential_type}: {}",
                response.status()
            );
            return Vec::new();
        }

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                log::warn!("failed to parse schema for {credential_type}: {e}");
                return Vec::new();
            }
        };

        let fields: Vec<String> = body
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| properties.keys().cloned().collect())
            .unwrap_or_default();
        log::debug!("schema fields for {credential_type}: {}", fields.join(", "));
        fields
    }

    fn read_api_key(&self) -> Option<String> {
        match std::fs::read_to_string(&self.api_key_path) {
            Ok(content) => {
                let key = content.trim().to_string();
                if key.is_empty() {
                    log::warn!("service api key file is empty: {}", self.api_key_path.display());
                    None
                } else {
                    Some(key)
                }
            }
            Err(e) => {
                log::debug!(
                    "service api key not readable at {}: {}",
                    self.api_key_path.display(),
                    e
                );
                None
            }
        }
    }
}
