//! Outbound event delivery to the sync server
//!
//! At-most-once semantics: a timed-out or failed delivery is logged and
//! dropped, never retried. The platform remains authoritative, so a missed
//! delivery only means file-representation staleness until the next event.

use crate::config::CaptureConfig;
use eyre::{Context, Result, eyre};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use url::Url;

/// HTTP client for authenticated webhook deliveries
#[derive(Debug, Clone)]
pub struct DeliveryClient {
    http: Client,
    server_url: Url,
    secret: Option<String>,
}

impl DeliveryClient {
    pub fn try_new(config: CaptureConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build delivery client")?;
        Ok(Self {
            http,
            server_url: config.server_url,
            secret: config.secret,
        })
    }

    /// Fire-and-forget delivery: spawns the request and returns immediately.
    ///
    /// The outcome is only ever logged; the caller's critical path never
    /// awaits it.
    pub fn send(&self, path: &'static str, payload: &impl Serialize) {
        let payload = match serde_json::to_value(payload) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("failed to serialize payload for {path}: {e}");
                return;
            }
        };
        let client = self.clone();
        tokio::spawn(async move {
            match client.deliver(path, &payload).await {
                Ok(status) => log::debug!("sync server response for {path}: {status}"),
                Err(e) => log::warn!("delivery to {path} failed: {e}"),
            }
        });
    }

    /// Perform one delivery and return the response status
    pub async fn deliver(&self, path: &str, payload: &serde_json::Value) -> Result<StatusCode> {
        let url = self
            .server_url
            .join(path.strip_prefix('/').unwrap_or(path))
            .map_err(|e| eyre!("Invalid delivery path {path}: {e}"))?;

        let mut request = self.http.post(url).json(payload);
        if let Some(secret) = &self.secret {
            request = request.header("x-webhook-secret", secret);
        }

        let response = request
            .send()
            .await
            .map_err(|e| eyre!("Failed to send request: {e}"))?;
        Ok(response.status())
    }
}
