//! Sampling invocation: read, evaluate, append
//!
//! [`Sampler::run_once`] takes the three readings, builds one log record,
//! appends it and always emits exactly one completion notice. A failed
//! reading aborts the invocation without writing anything; a failed write is
//! reported in the outcome. Neither escapes as an error.

use crate::alert::{append_logged, AlertThresholds, LogRecord, LogWriteError, DEFAULT_LOG_PATH};
use crate::collector::{collect_details, MetricsProvider, SamplerError};
use crate::models::{MetricSample, SampleDetails};
use crate::observability::{MonitorMetrics, StructuredLogger};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Where a sampler reads from and writes to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Append-only log file
    pub log_path: PathBuf,
    /// Any path on the filesystem whose utilization is sampled
    pub disk_path: PathBuf,
    /// Alert thresholds
    pub thresholds: AlertThresholds,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            disk_path: PathBuf::from("/"),
            thresholds: AlertThresholds::default(),
        }
    }
}

/// Readings and the record built from them
#[derive(Debug, Clone)]
pub struct SampleReport {
    pub details: SampleDetails,
    pub sample: MetricSample,
    pub record: LogRecord,
}

/// Result of one sampling invocation
#[derive(Debug)]
pub enum RunOutcome {
    /// Record appended to the log file
    Written(SampleReport),
    /// Record built but the append failed
    WriteFailed(SampleReport, LogWriteError),
    /// A reading failed; nothing was built or written
    SamplingFailed(SamplerError),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Written(_))
    }

    pub fn report(&self) -> Option<&SampleReport> {
        match self {
            RunOutcome::Written(report) | RunOutcome::WriteFailed(report, _) => Some(report),
            RunOutcome::SamplingFailed(_) => None,
        }
    }
}

/// Emits the completion notice when dropped, on every exit path
struct CompletionNotice<'a> {
    completed_runs: &'a AtomicU64,
    metrics: &'a MonitorMetrics,
}

impl Drop for CompletionNotice<'_> {
    fn drop(&mut self) {
        let runs = self.completed_runs.fetch_add(1, Ordering::SeqCst) + 1;
        self.metrics.inc_sampling_runs();
        info!(event = "sampling_completed", runs = runs, "Sampling task completed");
    }
}

/// Runs sampling invocations against a metrics provider
pub struct Sampler<P> {
    provider: P,
    config: SamplerConfig,
    metrics: MonitorMetrics,
    logger: StructuredLogger,
    completed_runs: AtomicU64,
}

impl<P: MetricsProvider> Sampler<P> {
    pub fn new(provider: P, config: SamplerConfig) -> Self {
        Self {
            provider,
            config,
            metrics: MonitorMetrics::new(),
            logger: StructuredLogger::for_local_host(),
            completed_runs: AtomicU64::new(0),
        }
    }

    /// Use a specific logger (e.g. one tagged with a configured host name)
    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Number of invocations that have run to completion
    pub fn completed_runs(&self) -> u64 {
        self.completed_runs.load(Ordering::SeqCst)
    }

    /// Sample, evaluate thresholds and append one record
    pub fn run_once(&mut self) -> RunOutcome {
        let _notice = CompletionNotice {
            completed_runs: &self.completed_runs,
            metrics: &self.metrics,
        };

        let details = match collect_details(&mut self.provider, &self.config.disk_path) {
            Ok(details) => details,
            Err(e) => {
                self.metrics.inc_sampling_errors();
                self.logger.log_sampling_failure(&e);
                return RunOutcome::SamplingFailed(e);
            }
        };

        let sample = details.to_sample(Local::now().naive_local());
        let record = LogRecord::from_sample(&sample, &self.config.thresholds);

        self.metrics.observe_sample(&sample);
        for alert in record.alerts() {
            self.metrics.inc_alert(alert.metric);
            self.logger
                .log_threshold_breach(alert, self.config.thresholds.for_metric(alert.metric));
        }
        self.logger.log_sample(&sample, record.alerts().len());

        let written = append_logged(&record.to_string(), &self.config.log_path);
        let report = SampleReport {
            details,
            sample,
            record,
        };

        match written {
            Ok(()) => RunOutcome::Written(report),
            Err(e) => {
                self.metrics.inc_log_write_errors();
                RunOutcome::WriteFailed(report, e)
            }
        }
    }
}
