//! Host metrics read through `sysinfo`
//!
//! CPU usage needs two refreshes separated by a measurement interval, so
//! `sample_cpu` blocks for that interval. Memory and disk are read at the
//! instant of the call. Disk space comes from `statvfs` on Unix so that
//! blocks reserved for the superuser are not counted as used.

use super::{validate_percent, MetricsProvider, SamplerError};
use crate::models::{percent_of, round_percent, CpuReading, DiskReading, MemoryReading, Metric};
use std::path::{Path, PathBuf};
use std::time::Duration;
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::debug;

/// Default CPU measurement interval
pub const DEFAULT_CPU_INTERVAL: Duration = Duration::from_secs(1);

/// Metrics provider backed by the local operating system
pub struct SysinfoProvider {
    system: System,
    disks: Disks,
    cpu_interval: Duration,
}

impl SysinfoProvider {
    /// Create a provider measuring CPU over `cpu_interval`.
    ///
    /// Intervals shorter than the platform minimum are raised to it.
    pub fn new(cpu_interval: Duration) -> Self {
        Self {
            system: System::new(),
            disks: Disks::new(),
            cpu_interval: cpu_interval.max(MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }

    pub fn cpu_interval(&self) -> Duration {
        self.cpu_interval
    }
}

impl Default for SysinfoProvider {
    fn default() -> Self {
        Self::new(DEFAULT_CPU_INTERVAL)
    }
}

impl MetricsProvider for SysinfoProvider {
    fn sample_cpu(&mut self) -> Result<CpuReading, SamplerError> {
        self.system.refresh_cpu();
        std::thread::sleep(self.cpu_interval);
        self.system.refresh_cpu();

        let logical_cores = self.system.cpus().len();
        if logical_cores == 0 {
            return Err(SamplerError::NoCpuData);
        }

        let percent = validate_percent(
            Metric::Cpu,
            round_percent(f64::from(self.system.global_cpu_info().cpu_usage())),
        )?;

        Ok(CpuReading {
            percent,
            logical_cores,
            physical_cores: self.system.physical_core_count(),
        })
    }

    fn sample_memory(&mut self) -> Result<MemoryReading, SamplerError> {
        self.system.refresh_memory();

        let total_bytes = self.system.total_memory();
        let available_bytes = self.system.available_memory();
        let used_bytes = total_bytes.saturating_sub(available_bytes);

        let percent = percent_of(used_bytes, total_bytes).ok_or(SamplerError::NoMemoryData)?;

        Ok(MemoryReading {
            percent: validate_percent(Metric::Memory, round_percent(percent))?,
            total_bytes,
            used_bytes,
            available_bytes,
        })
    }

    fn sample_disk(&mut self, path: &Path) -> Result<DiskReading, SamplerError> {
        let resolved = path.canonicalize().map_err(|source| SamplerError::DiskPath {
            path: path.to_path_buf(),
            source,
        })?;

        self.disks.refresh_list();

        let mounts: Vec<(PathBuf, u64, u64)> = self
            .disks
            .list()
            .iter()
            .map(|disk| {
                (
                    disk.mount_point().to_path_buf(),
                    disk.total_space(),
                    disk.available_space(),
                )
            })
            .collect();

        let mount = containing_mount(&resolved, &mounts);
        let space = filesystem_space(&resolved, mount.as_ref())?;
        let usage = space
            .usage()
            .ok_or_else(|| SamplerError::DiskNotFound(resolved.clone()))?;

        let mount_point = mount
            .map(|(mount_point, _, _)| mount_point)
            .unwrap_or_else(|| resolved.clone());

        debug!(
            path = %resolved.display(),
            mount_point = %mount_point.display(),
            total_bytes = space.total_bytes,
            free_bytes = space.free_bytes,
            available_bytes = space.available_bytes,
            "Resolved filesystem for disk sample"
        );

        Ok(DiskReading {
            percent: validate_percent(Metric::Disk, round_percent(usage.percent))?,
            mount_point: mount_point.display().to_string(),
            total_bytes: space.total_bytes,
            used_bytes: usage.used_bytes,
            available_bytes: space.available_bytes,
        })
    }
}

/// Space figures of one filesystem, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FilesystemSpace {
    total_bytes: u64,
    /// Free blocks, including those reserved for the superuser
    free_bytes: u64,
    /// Free blocks available to unprivileged users
    available_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DiskUsage {
    used_bytes: u64,
    percent: f64,
}

impl FilesystemSpace {
    fn from_blocks(blocks: u64, free: u64, available: u64, fragment_size: u64) -> Self {
        Self {
            total_bytes: blocks.saturating_mul(fragment_size),
            free_bytes: free.saturating_mul(fragment_size),
            available_bytes: available.saturating_mul(fragment_size),
        }
    }

    /// Used space over the space an unprivileged user could fill, as `df`
    /// reports it. Reserved blocks count as neither used nor available.
    fn usage(&self) -> Option<DiskUsage> {
        let used_bytes = self.total_bytes.saturating_sub(self.free_bytes);
        let percent = percent_of(used_bytes, used_bytes.saturating_add(self.available_bytes))?;
        Some(DiskUsage {
            used_bytes,
            percent,
        })
    }
}

#[cfg(unix)]
#[allow(clippy::unnecessary_cast)]
fn filesystem_space(
    path: &Path,
    _mount: Option<&(PathBuf, u64, u64)>,
) -> Result<FilesystemSpace, SamplerError> {
    let stat = nix::sys::statvfs::statvfs(path).map_err(|errno| SamplerError::DiskPath {
        path: path.to_path_buf(),
        source: std::io::Error::from(errno),
    })?;

    Ok(FilesystemSpace::from_blocks(
        stat.blocks() as u64,
        stat.blocks_free() as u64,
        stat.blocks_available() as u64,
        stat.fragment_size() as u64,
    ))
}

/// Without statvfs only total and available space are known
#[cfg(not(unix))]
fn filesystem_space(
    path: &Path,
    mount: Option<&(PathBuf, u64, u64)>,
) -> Result<FilesystemSpace, SamplerError> {
    let (_, total_bytes, available_bytes) =
        mount.ok_or_else(|| SamplerError::DiskNotFound(path.to_path_buf()))?;
    Ok(FilesystemSpace {
        total_bytes: *total_bytes,
        free_bytes: *available_bytes,
        available_bytes: *available_bytes,
    })
}

/// Pick the mount with the longest mount point that prefixes `path`
fn containing_mount(path: &Path, mounts: &[(PathBuf, u64, u64)]) -> Option<(PathBuf, u64, u64)> {
    mounts
        .iter()
        .filter(|(mount_point, _, _)| path.starts_with(mount_point))
        .max_by_key(|(mount_point, _, _)| mount_point.components().count())
        .cloned()
}
