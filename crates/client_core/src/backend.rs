use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::protocol::PresenceSnapshot;

use crate::config::BackendUrl;

/// HTTP side of the backend: the presence snapshot and the health endpoint.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn fetch_presence(&self) -> Result<PresenceSnapshot>;
    async fn check_health(&self) -> Result<()>;
}

pub struct HttpBackend {
    http: Client,
    base: BackendUrl,
}

impl HttpBackend {
    pub fn new(base: BackendUrl) -> Self {
        Self {
            http: Client::new(),
            base,
        }
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn fetch_presence(&self) -> Result<PresenceSnapshot> {
        let url = self.base.users_url();
        let body = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to request presence snapshot: {url}"))?
            .error_for_status()?
            .text()
            .await
            .context("failed to read presence snapshot body")?;
        let snapshot = PresenceSnapshot::from_json(&body)
            .with_context(|| format!("invalid presence snapshot from {url}"))?;
        Ok(snapshot)
    }

    async fn check_health(&self) -> Result<()> {
        let url = self.base.health_url();
        self.http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("failed to reach health endpoint: {url}"))?
            .error_for_status()?;
        Ok(())
    }
}
