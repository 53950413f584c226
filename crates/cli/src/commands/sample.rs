//! One-shot and periodic resource sampling

use agent_lib::collector::{SamplingLoopBuilder, DEFAULT_CPU_INTERVAL};
use agent_lib::{
    ProcessUsage, RunOutcome, SampleDetails, SampleReport, Sampler, SamplerConfig, SysinfoProvider,
};
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tabled::Tabled;
use tokio::sync::broadcast;

use crate::commands::top::{collect_top_processes, print_processes};
use crate::output::{
    color_percent, format_bytes, print_error, print_info, print_json, print_success, print_table,
    print_warning, OutputFormat,
};

/// Row for the resource usage table
#[derive(Tabled, Serialize)]
struct ResourceRow {
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Used")]
    used: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Usage")]
    usage: String,
}

fn resource_rows(details: &SampleDetails, threshold: f64) -> Vec<ResourceRow> {
    let cores = match details.cpu.physical_cores {
        Some(physical) => format!("{} cores ({} physical)", details.cpu.logical_cores, physical),
        None => format!("{} cores", details.cpu.logical_cores),
    };

    vec![
        ResourceRow {
            resource: "CPU".to_string(),
            total: cores,
            used: "-".to_string(),
            available: "-".to_string(),
            usage: color_percent(details.cpu.percent, threshold),
        },
        ResourceRow {
            resource: "Memory".to_string(),
            total: format_bytes(details.memory.total_bytes),
            used: format_bytes(details.memory.used_bytes),
            available: format_bytes(details.memory.available_bytes),
            usage: color_percent(details.memory.percent, threshold),
        },
        ResourceRow {
            resource: format!("Disk ({})", details.disk.mount_point),
            total: format_bytes(details.disk.total_bytes),
            used: format_bytes(details.disk.used_bytes),
            available: format_bytes(details.disk.available_bytes),
            usage: color_percent(details.disk.percent, threshold),
        },
    ]
}

/// Machine-readable result of `healthwatch sample`
#[derive(Serialize)]
struct SampleOutput<'a> {
    written: bool,
    log_file: &'a PathBuf,
    details: Option<&'a SampleDetails>,
    record: Option<String>,
    alerts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    top_processes: Vec<ProcessUsage>,
}

/// Settings shared by `sample` and `watch`
#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub config: SamplerConfig,
    pub cpu_interval: Duration,
}

impl SampleOptions {
    fn sampler(&self) -> Sampler<SysinfoProvider> {
        Sampler::new(SysinfoProvider::new(self.cpu_interval), self.config.clone())
    }
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            config: SamplerConfig::default(),
            cpu_interval: DEFAULT_CPU_INTERVAL,
        }
    }
}

/// Run one sampling invocation. Returns whether a record was appended.
pub async fn run_sample(options: SampleOptions, top: usize, format: OutputFormat) -> Result<bool> {
    let sampler_options = options.clone();
    let outcome = tokio::task::spawn_blocking(move || sampler_options.sampler().run_once())
        .await
        .context("Sampling task failed")?;

    let top_processes = if top > 0 {
        collect_top_processes(top).await?
    } else {
        Vec::new()
    };

    let log_file = &options.config.log_path;
    let threshold = options.config.thresholds.cpu;

    match format {
        OutputFormat::Json => {
            let report = outcome.report();
            print_json(&SampleOutput {
                written: outcome.is_success(),
                log_file,
                details: report.map(|r| &r.details),
                record: report.map(|r| r.record.to_string()),
                alerts: report
                    .map(|r| r.record.alerts().iter().map(ToString::to_string).collect())
                    .unwrap_or_default(),
                error: outcome_error(&outcome),
                top_processes,
            });
        }
        OutputFormat::Table => {
            match &outcome {
                RunOutcome::Written(report) => {
                    print_report(report, threshold);
                    print_success(&format!("Record appended to {}", log_file.display()));
                }
                RunOutcome::WriteFailed(report, e) => {
                    print_report(report, threshold);
                    print_error(&format!("Failed to append record: {}", e));
                }
                RunOutcome::SamplingFailed(e) => {
                    print_error(&format!("Sampling failed: {}", e));
                }
            }

            if !top_processes.is_empty() {
                println!();
                println!("{}", "Top Processes by Memory".bold());
                print_processes(&top_processes, format);
            }

            print_info("Sampling task completed");
        }
    }

    Ok(outcome.is_success())
}

/// Cause of a failed run, including the underlying io error for writes
fn outcome_error(outcome: &RunOutcome) -> Option<String> {
    match outcome {
        RunOutcome::Written(_) => None,
        RunOutcome::WriteFailed(_, e) => Some(e.to_string()),
        RunOutcome::SamplingFailed(e) => Some(e.to_string()),
    }
}

fn print_report(report: &SampleReport, threshold: f64) {
    println!("{}", "Resource Usage".bold());
    print_table(&resource_rows(&report.details, threshold), OutputFormat::Table);

    if report.record.has_alerts() {
        for alert in report.record.alerts() {
            print_warning(&alert.to_string());
        }
    } else {
        print_success(&format!("No usage above {}%", threshold));
    }
}

/// Sample every `interval` until Ctrl+C. Returns the number of runs.
pub async fn watch(options: SampleOptions, interval: Duration) -> Result<u64> {
    let sampling_loop = SamplingLoopBuilder::new()
        .sampler(options.sampler())
        .interval(interval)
        .build()?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    print_info(&format!(
        "Sampling every {}s into {} (Ctrl+C to stop)",
        interval.as_secs(),
        options.config.log_path.display()
    ));

    let runs = sampling_loop.run(shutdown_rx).await;
    print_success(&format!("Stopped after {} runs", runs));

    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_lib::alert::{append_record, AlertThresholds};
    use agent_lib::models::{CpuReading, DiskReading, MemoryReading};
    use agent_lib::{LogRecord, SamplerError};

    fn details() -> SampleDetails {
        SampleDetails {
            cpu: CpuReading {
                percent: 95.0,
                logical_cores: 8,
                physical_cores: Some(4),
            },
            memory: MemoryReading {
                percent: 50.0,
                total_bytes: 16 * 1024 * 1024 * 1024,
                used_bytes: 8 * 1024 * 1024 * 1024,
                available_bytes: 8 * 1024 * 1024 * 1024,
            },
            disk: DiskReading {
                percent: 10.0,
                mount_point: "/".to_string(),
                total_bytes: 100 * 1024 * 1024 * 1024,
                used_bytes: 10 * 1024 * 1024 * 1024,
                available_bytes: 90 * 1024 * 1024 * 1024,
            },
        }
    }

    #[test]
    fn test_resource_rows_in_metric_order() {
        colored::control::set_override(false);
        let rows = resource_rows(&details(), 80.0);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].resource, "CPU");
        assert_eq!(rows[0].total, "8 cores (4 physical)");
        assert_eq!(rows[0].usage, "95.0%");
        assert_eq!(rows[1].resource, "Memory");
        assert_eq!(rows[1].total, "16.00Gi");
        assert_eq!(rows[2].resource, "Disk (/)");
        assert_eq!(rows[2].available, "90.00Gi");
    }

    #[test]
    fn test_write_failure_error_keeps_io_cause() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("missing").join("system-logs.txt");
        let write_error = append_record("['Timestamp: x']", &log_path).unwrap_err();

        let details = details();
        let sample = details.to_sample(chrono::Local::now().naive_local());
        let record = LogRecord::from_sample(&sample, &AlertThresholds::default());
        let outcome = RunOutcome::WriteFailed(
            SampleReport {
                details,
                sample,
                record,
            },
            write_error,
        );

        let error = outcome_error(&outcome).unwrap();
        assert!(error.contains("missing"));
        assert!(error.contains("No such file"));
    }

    #[test]
    fn test_sampling_failure_error_is_reported() {
        let failed = RunOutcome::SamplingFailed(SamplerError::NoCpuData);
        assert_eq!(
            outcome_error(&failed).unwrap(),
            SamplerError::NoCpuData.to_string()
        );
    }

    #[tokio::test]
    async fn test_watch_rejects_zero_interval() {
        let result = watch(SampleOptions::default(), Duration::ZERO).await;
        assert!(result.is_err());
    }
}
