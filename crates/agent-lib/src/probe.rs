//! Website reachability probe
//!
//! One GET with a timeout. A 200 passes; any other status, a timeout or a
//! transport error fails. Failures are reported in the result, never
//! returned as errors.

use crate::health::{CheckOutcome, Checker};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Website probed when none is configured
pub const DEFAULT_PROBE_URL: &str = "https://aws.amazon.com/";

/// Request timeout when none is configured
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Checker name reported in health results
pub const WEBSITE_UPTIME: &str = "website_uptime";

/// Probes one URL for a 200 response
#[derive(Debug, Clone)]
pub struct ReachabilityProbe {
    client: Client,
    url: Url,
    site: String,
    timeout: Duration,
}

impl ReachabilityProbe {
    /// Create a probe for `url` with a per-request `timeout`
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("Invalid probe URL: {}", url))?;
        let site = site_name(&url).with_context(|| format!("Probe URL has no host: {}", url))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url,
            site,
            timeout,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Network location shown in probe messages
    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue the request and classify the response
    pub async fn probe(&self) -> CheckOutcome {
        match self.client.get(self.url.clone()).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                CheckOutcome::pass(format!("{} is reachable", self.site))
            }
            Ok(response) => CheckOutcome::fail(format!(
                "{} returned {}",
                self.site,
                response.status().as_u16()
            )),
            Err(e) if e.is_timeout() => CheckOutcome::fail(format!(
                "{} did not respond within {}s",
                self.site,
                self.timeout.as_secs_f64()
            )),
            Err(e) => CheckOutcome::fail(format!("{} is unreachable: {}", self.site, e)),
        }
    }
}

#[async_trait]
impl Checker for ReachabilityProbe {
    fn name(&self) -> &str {
        WEBSITE_UPTIME
    }

    async fn check(&self) -> CheckOutcome {
        self.probe().await
    }
}

/// Host plus any explicit port, e.g. `aws.amazon.com` or `127.0.0.1:8080`
fn site_name(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
