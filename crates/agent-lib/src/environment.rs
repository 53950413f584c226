//! Environment metadata dump
//!
//! Static application metadata plus a description of the host OS and the
//! running process. Environment variables are not included.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use sysinfo::System;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsInfo {
    pub platform: String,
    pub name: Option<String>,
    pub release: Option<String>,
    pub version: Option<String>,
    pub arch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub argv: Vec<String>,
    pub cwd: Option<String>,
    pub version: String,
}

/// Environment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentReport {
    pub hostname: String,
    pub timestamp: i64,
    pub os: OsInfo,
    pub process: ProcessInfo,
    pub application: BTreeMap<String, Value>,
}

/// Produces [`EnvironmentReport`]s for a fixed set of application metadata
#[derive(Debug, Clone, Default)]
pub struct EnvironmentDump {
    application: BTreeMap<String, Value>,
    version: String,
}

impl EnvironmentDump {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            application: BTreeMap::new(),
            version: version.into(),
        }
    }

    /// Add one application metadata entry
    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.application.insert(key.into(), value.into());
        self
    }

    pub fn application(&self) -> &BTreeMap<String, Value> {
        &self.application
    }

    pub fn report(&self) -> EnvironmentReport {
        EnvironmentReport {
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            timestamp: chrono::Utc::now().timestamp(),
            os: OsInfo {
                platform: std::env::consts::OS.to_string(),
                name: System::name(),
                release: System::kernel_version(),
                version: System::os_version(),
                arch: std::env::consts::ARCH.to_string(),
            },
            process: ProcessInfo {
                pid: std::process::id(),
                argv: std::env::args().collect(),
                cwd: std::env::current_dir()
                    .ok()
                    .map(|dir| dir.display().to_string()),
                version: self.version.clone(),
            },
            application: self.application.clone(),
        }
    }
}
