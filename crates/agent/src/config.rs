//! Agent configuration

use agent_lib::{
    alert::{validate_threshold, AlertThresholds, DEFAULT_LOG_PATH, DEFAULT_THRESHOLD},
    collector::DEFAULT_SAMPLE_INTERVAL,
    health::{DEFAULT_FAILED_TTL, DEFAULT_SUCCESS_TTL},
    probe::{DEFAULT_PROBE_TIMEOUT, DEFAULT_PROBE_URL},
    SamplerConfig,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Agent configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// HTTP port for the health, environment and metrics endpoints
    #[serde(default = "default_port")]
    pub port: u16,

    /// Website probed by the health check
    #[serde(default = "default_probe_url")]
    pub probe_url: String,

    /// Probe request timeout in seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Seconds a passing health result is reused
    #[serde(default = "default_success_ttl")]
    pub success_ttl_secs: u64,

    /// Seconds a failing health result is reused
    #[serde(default = "default_failed_ttl")]
    pub failed_ttl_secs: u64,

    /// Maintainer reported by the environment endpoint
    #[serde(default = "default_maintainer")]
    pub maintainer: String,

    /// Repository owner reported by the environment endpoint
    #[serde(default = "default_git_owner")]
    pub git_owner: String,

    /// Run the resource sampler inside the agent
    #[serde(default)]
    pub sampler_enabled: bool,

    /// Seconds between sampling runs
    #[serde(default = "default_sample_interval")]
    pub sample_interval_secs: u64,

    /// Append-only log file for sampling records
    #[serde(default = "default_log_path")]
    pub log_path: String,

    /// Path whose filesystem utilization is sampled
    #[serde(default = "default_disk_path")]
    pub disk_path: String,

    /// Alert threshold in percent, applied to every metric
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_port() -> u16 {
    5000
}

fn default_probe_url() -> String {
    DEFAULT_PROBE_URL.to_string()
}

fn default_probe_timeout() -> u64 {
    DEFAULT_PROBE_TIMEOUT.as_secs()
}

fn default_success_ttl() -> u64 {
    DEFAULT_SUCCESS_TTL.as_secs()
}

fn default_failed_ttl() -> u64 {
    DEFAULT_FAILED_TTL.as_secs()
}

fn default_maintainer() -> String {
    "Aryan".to_string()
}

fn default_git_owner() -> String {
    "https://github.com/a7ryan".to_string()
}

fn default_sample_interval() -> u64 {
    DEFAULT_SAMPLE_INTERVAL.as_secs()
}

fn default_log_path() -> String {
    DEFAULT_LOG_PATH.to_string()
}

fn default_disk_path() -> String {
    "/".to_string()
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            probe_url: default_probe_url(),
            probe_timeout_secs: default_probe_timeout(),
            success_ttl_secs: default_success_ttl(),
            failed_ttl_secs: default_failed_ttl(),
            maintainer: default_maintainer(),
            git_owner: default_git_owner(),
            sampler_enabled: false,
            sample_interval_secs: default_sample_interval(),
            log_path: default_log_path(),
            disk_path: default_disk_path(),
            threshold: default_threshold(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from `HEALTHWATCH_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("HEALTHWATCH").try_parsing(true))
            .build()
            .context("Failed to read environment configuration")?;

        Self::from_config(config)
    }

    /// Deserialize from an already-built configuration
    pub fn from_config(config: config::Config) -> Result<Self> {
        let agent: Self = config
            .try_deserialize()
            .context("Invalid HEALTHWATCH_* configuration")?;

        validate_threshold(agent.threshold).context("Invalid HEALTHWATCH_THRESHOLD")?;

        Ok(agent)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_secs(self.sample_interval_secs)
    }

    /// Sampler settings derived from this configuration
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            log_path: PathBuf::from(&self.log_path),
            disk_path: PathBuf::from(&self.disk_path),
            thresholds: AlertThresholds::uniform(self.threshold),
        }
    }
}
