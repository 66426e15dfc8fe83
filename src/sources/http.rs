use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::info;

use super::{RemoteSnapshot, RemoteSnapshotSource};

/// HTTP adapter for the tracking backend.
///
/// Every call is bounded by the client-level timeout; the engine treats
/// any failure here as transient and keeps running on local state.
pub struct HttpSnapshotSource {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpSnapshotSource {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| anyhow!("failed to build http client: {err}"))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("{what} failed: {status} - {text}"));
        }
        Ok(response)
    }
}

#[async_trait]
impl RemoteSnapshotSource for HttpSnapshotSource {
    async fn fetch_snapshot(&self) -> Result<RemoteSnapshot> {
        let response = self
            .client
            .get(self.url("/api/tracker/snapshot"))
            .bearer_auth(&self.token)
            .send()
            .await?;

        let response = Self::check(response, "snapshot fetch").await?;
        let snapshot = response.json::<RemoteSnapshot>().await?;
        Ok(snapshot)
    }

    async fn set_tracking_enabled(&self, enabled: bool) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/tracker/tracking"))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "enabled": enabled }))
            .send()
            .await?;

        Self::check(response, "tracking toggle").await?;
        Ok(())
    }

    async fn finalize_session(&self, run_id: &str) -> Result<()> {
        info!("Finalizing tracking session {run_id}");

        let response = self
            .client
            .post(self.url("/api/tracker/finalize"))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "runId": run_id }))
            .send()
            .await?;

        Self::check(response, "session finalize").await?;
        Ok(())
    }
}
