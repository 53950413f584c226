//! Configuration management for the CLI

use agent_lib::alert::{DEFAULT_LOG_PATH, DEFAULT_THRESHOLD};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::client::DEFAULT_AGENT_URL;

/// CLI configuration file contents. Every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Log file that sampling records are appended to
    pub log_file: Option<PathBuf>,
    /// Path whose filesystem utilization is sampled
    pub disk_path: Option<PathBuf>,
    /// Alert threshold in percent
    pub threshold: Option<f64>,
    /// Agent endpoint URL
    pub agent_url: Option<String>,
}

impl Config {
    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from `path`, or defaults if the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Get the configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("healthwatch").join("config.json"))
    }

    pub fn log_file(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.log_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH))
    }

    pub fn disk_path(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.disk_path.clone())
            .unwrap_or_else(|| PathBuf::from("/"))
    }

    pub fn threshold(&self, flag: Option<f64>) -> f64 {
        flag.or(self.threshold).unwrap_or(DEFAULT_THRESHOLD)
    }

    pub fn agent_url(&self, flag: Option<String>) -> String {
        flag.or_else(|| self.agent_url.clone())
            .unwrap_or_else(|| DEFAULT_AGENT_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.log_file(None), PathBuf::from("system-logs.txt"));
        assert_eq!(config.disk_path(None), PathBuf::from("/"));
        assert_eq!(config.threshold(None), 80.0);
        assert_eq!(config.agent_url(None), "http://localhost:5000");
    }

    #[test]
    fn test_file_values_apply_and_flags_win() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"log_file": "/var/log/hw.txt", "threshold": 90.0, "agent_url": "http://web-1:5000"}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        assert_eq!(config.log_file(None), PathBuf::from("/var/log/hw.txt"));
        assert_eq!(config.threshold(None), 90.0);
        assert_eq!(config.threshold(Some(70.0)), 70.0);
        assert_eq!(
            config.agent_url(Some("http://other:5000".to_string())),
            "http://other:5000"
        );
        assert_eq!(config.disk_path(None), PathBuf::from("/"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
