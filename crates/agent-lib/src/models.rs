//! Core data models for the resource sampler

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource tracked by the sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cpu,
    Memory,
    Disk,
}

impl Metric {
    /// Fixed evaluation order used when building log records
    pub const ALL: [Metric; 3] = [Metric::Cpu, Metric::Memory, Metric::Disk];
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Cpu => write!(f, "CPU"),
            Metric::Memory => write!(f, "Memory"),
            Metric::Disk => write!(f, "Disk"),
        }
    }
}

/// Point-in-time utilization of the three sampled resources.
///
/// Built once per sampling invocation and passed by value into record
/// construction; nothing mutates it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub timestamp: NaiveDateTime,
}

impl MetricSample {
    pub fn new(cpu_percent: f64, memory_percent: f64, disk_percent: f64, timestamp: NaiveDateTime) -> Self {
        Self {
            cpu_percent,
            memory_percent,
            disk_percent,
            timestamp,
        }
    }

    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Cpu => self.cpu_percent,
            Metric::Memory => self.memory_percent,
            Metric::Disk => self.disk_percent,
        }
    }

    /// Sample stamped with the local wall-clock time
    pub fn now(cpu_percent: f64, memory_percent: f64, disk_percent: f64) -> Self {
        Self::new(cpu_percent, memory_percent, disk_percent, Local::now().naive_local())
    }
}

/// CPU utilization averaged over the measurement interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuReading {
    pub percent: f64,
    pub logical_cores: usize,
    pub physical_cores: Option<usize>,
}

/// Virtual memory utilization at the instant of the call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryReading {
    pub percent: f64,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
}

/// Utilization of the filesystem that contains the sampled path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskReading {
    pub percent: f64,
    pub mount_point: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
}

/// Full readings of one invocation, including the informational totals
/// shown on the operator console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleDetails {
    pub cpu: CpuReading,
    pub memory: MemoryReading,
    pub disk: DiskReading,
}

impl SampleDetails {
    /// Keep only the percentages, stamped with `timestamp`
    pub fn to_sample(&self, timestamp: NaiveDateTime) -> MetricSample {
        MetricSample::new(self.cpu.percent, self.memory.percent, self.disk.percent, timestamp)
    }
}

/// Memory usage of a single process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessUsage {
    pub pid: u32,
    pub name: String,
    pub user: Option<String>,
    pub memory_bytes: u64,
    pub memory_percent: f64,
}

/// Convert a used/total pair into a percentage, `None` when total is zero
pub fn percent_of(used: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(used as f64 / total as f64 * 100.0)
}

/// Round to one decimal place, the precision readings are reported with
pub fn round_percent(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
