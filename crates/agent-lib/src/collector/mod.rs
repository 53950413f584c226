//! Resource metrics collection
//!
//! This module provides the [`MetricsProvider`] seam used by the sampler,
//! a `sysinfo`-backed implementation, the top process memory lister and the
//! periodic sampling loop.

mod r#loop;
mod processes;
mod system;

pub use processes::{rank_by_memory, ProcessLister, DEFAULT_TOP_PROCESSES};
pub use r#loop::{SamplingLoop, SamplingLoopBuilder, DEFAULT_SAMPLE_INTERVAL};
pub use system::{SysinfoProvider, DEFAULT_CPU_INTERVAL};

use crate::models::{CpuReading, DiskReading, Metric, MemoryReading, SampleDetails};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failure to acquire one of the resource readings
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("no CPU information reported by the operating system")]
    NoCpuData,

    #[error("no memory information reported by the operating system")]
    NoMemoryData,

    #[error("cannot resolve disk path {path}: {source}")]
    DiskPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no mounted filesystem contains {0}")]
    DiskNotFound(PathBuf),

    #[error("{metric} reading {value} is outside 0-100%")]
    InvalidPercent { metric: Metric, value: f64 },
}

/// Source of the three utilization readings.
///
/// Calls are blocking; `sample_cpu` waits out its measurement interval.
pub trait MetricsProvider: Send {
    /// System-wide CPU utilization averaged over the measurement interval
    fn sample_cpu(&mut self) -> Result<CpuReading, SamplerError>;

    /// Virtual memory utilization right now
    fn sample_memory(&mut self) -> Result<MemoryReading, SamplerError>;

    /// Utilization of the filesystem holding `path`
    fn sample_disk(&mut self, path: &Path) -> Result<DiskReading, SamplerError>;
}

/// Take all three readings, stopping at the first failure
pub fn collect_details<P>(provider: &mut P, disk_path: &Path) -> Result<SampleDetails, SamplerError>
where
    P: MetricsProvider + ?Sized,
{
    let cpu = provider.sample_cpu()?;
    let memory = provider.sample_memory()?;
    let disk = provider.sample_disk(disk_path)?;

    Ok(SampleDetails { cpu, memory, disk })
}

/// Reject readings that are not a finite percentage
pub fn validate_percent(metric: Metric, value: f64) -> Result<f64, SamplerError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(SamplerError::InvalidPercent { metric, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider {
        fail_disk: bool,
        calls: Vec<Metric>,
    }

    impl MetricsProvider for FixedProvider {
        fn sample_cpu(&mut self) -> Result<CpuReading, SamplerError> {
            self.calls.push(Metric::Cpu);
            Ok(CpuReading {
                percent: 10.0,
                logical_cores: 4,
                physical_cores: Some(2),
            })
        }

        fn sample_memory(&mut self) -> Result<MemoryReading, SamplerError> {
            self.calls.push(Metric::Memory);
            Ok(MemoryReading {
                percent: 20.0,
                total_bytes: 100,
                used_bytes: 20,
                available_bytes: 80,
            })
        }

        fn sample_disk(&mut self, path: &Path) -> Result<DiskReading, SamplerError> {
            self.calls.push(Metric::Disk);
            if self.fail_disk {
                return Err(SamplerError::DiskNotFound(path.to_path_buf()));
            }
            Ok(DiskReading {
                percent: 30.0,
                mount_point: "/".to_string(),
                total_bytes: 100,
                used_bytes: 30,
                available_bytes: 70,
            })
        }
    }

    #[test]
    fn test_validate_percent_bounds() {
        assert_eq!(validate_percent(Metric::Cpu, 0.0).unwrap(), 0.0);
        assert_eq!(validate_percent(Metric::Cpu, 100.0).unwrap(), 100.0);
        assert!(validate_percent(Metric::Memory, 100.5).is_err());
        assert!(validate_percent(Metric::Disk, -1.0).is_err());
        assert!(validate_percent(Metric::Cpu, f64::NAN).is_err());
    }

    #[test]
    fn test_collect_details_reads_in_order() {
        let mut provider = FixedProvider {
            fail_disk: false,
            calls: Vec::new(),
        };

        let details = collect_details(&mut provider, Path::new("/")).unwrap();

        assert_eq!(provider.calls, vec![Metric::Cpu, Metric::Memory, Metric::Disk]);
        assert_eq!(details.cpu.percent, 10.0);
        assert_eq!(details.memory.percent, 20.0);
        assert_eq!(details.disk.percent, 30.0);
    }

    #[test]
    fn test_collect_details_propagates_failure() {
        let mut provider = FixedProvider {
            fail_disk: true,
            calls: Vec::new(),
        };

        let err = collect_details(&mut provider, Path::new("/data")).unwrap_err();

        assert!(matches!(err, SamplerError::DiskNotFound(_)));
        assert!(err.to_string().contains("/data"));
    }

    #[test]
    fn test_invalid_percent_message_names_metric() {
        let err = validate_percent(Metric::Memory, 120.0).unwrap_err();
        assert!(err.to_string().contains("Memory"));
        assert!(err.to_string().contains("120"));
    }
}
