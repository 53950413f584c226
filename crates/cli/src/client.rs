//! API client for querying a running healthwatch agent

use agent_lib::{EnvironmentReport, HealthReport};
use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

/// Default agent endpoint
pub const DEFAULT_AGENT_URL: &str = "http://localhost:5000";

/// API client for the agent's HTTP endpoints
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid agent URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Fetch the agent's aggregated health report
    pub async fn health(&self) -> Result<HealthReport> {
        self.get("healthcheck").await
    }

    /// Fetch the agent's environment metadata
    pub async fn environment(&self) -> Result<EnvironmentReport> {
        self.get("environment").await
    }
}
