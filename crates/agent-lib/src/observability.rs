//! Observability infrastructure for healthwatch
//!
//! Provides:
//! - Prometheus metrics (last sampled percentages, alert and error counters, probe latency)
//! - Structured JSON logging with tracing

use crate::alert::AlertLine;
use crate::collector::SamplerError;
use crate::models::{Metric, MetricSample};
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for probe latency (in seconds)
const PROBE_LATENCY_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct MonitorMetricsInner {
    usage_percent: GaugeVec,
    alerts_raised: IntCounterVec,
    sampling_runs: IntCounter,
    sampling_errors: IntCounter,
    log_write_errors: IntCounter,
    probe_latency_seconds: Histogram,
    probe_failures: IntCounter,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            usage_percent: register_gauge_vec!(
                "healthwatch_usage_percent",
                "Most recently sampled utilization in percent",
                &["metric"]
            )
            .expect("Failed to register usage_percent"),

            alerts_raised: register_int_counter_vec!(
                "healthwatch_alerts_total",
                "Threshold breaches recorded in the log file",
                &["metric"]
            )
            .expect("Failed to register alerts_total"),

            sampling_runs: register_int_counter!(
                "healthwatch_sampling_runs_total",
                "Sampling invocations that ran to completion"
            )
            .expect("Failed to register sampling_runs_total"),

            sampling_errors: register_int_counter!(
                "healthwatch_sampling_errors_total",
                "Sampling invocations aborted by a failed reading"
            )
            .expect("Failed to register sampling_errors_total"),

            log_write_errors: register_int_counter!(
                "healthwatch_log_write_errors_total",
                "Log records that could not be appended"
            )
            .expect("Failed to register log_write_errors_total"),

            probe_latency_seconds: register_histogram!(
                "healthwatch_probe_latency_seconds",
                "Time spent on reachability probes",
                PROBE_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register probe_latency_seconds"),

            probe_failures: register_int_counter!(
                "healthwatch_probe_failures_total",
                "Reachability probes that did not pass"
            )
            .expect("Failed to register probe_failures_total"),
        }
    }
}

fn metric_label(metric: Metric) -> &'static str {
    match metric {
        Metric::Cpu => "cpu",
        Metric::Memory => "memory",
        Metric::Disk => "disk",
    }
}

/// Handle to the process-wide Prometheus metrics.
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Publish the percentages of a fresh sample
    pub fn observe_sample(&self, sample: &MetricSample) {
        for metric in Metric::ALL {
            self.inner()
                .usage_percent
                .with_label_values(&[metric_label(metric)])
                .set(sample.value(metric));
        }
    }

    pub fn inc_alert(&self, metric: Metric) {
        self.inner()
            .alerts_raised
            .with_label_values(&[metric_label(metric)])
            .inc();
    }

    pub fn inc_sampling_runs(&self) {
        self.inner().sampling_runs.inc();
    }

    pub fn inc_sampling_errors(&self) {
        self.inner().sampling_errors.inc();
    }

    pub fn inc_log_write_errors(&self) {
        self.inner().log_write_errors.inc();
    }

    pub fn observe_probe_latency(&self, duration_secs: f64) {
        self.inner().probe_latency_seconds.observe(duration_secs);
    }

    pub fn inc_probe_failures(&self) {
        self.inner().probe_failures.inc();
    }
}

/// Structured logger for sampler and probe events
///
/// Provides consistent JSON-formatted logging for samples, threshold
/// breaches, probes and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    host_name: String,
}

impl StructuredLogger {
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
        }
    }

    /// Logger tagged with the local host name
    pub fn for_local_host() -> Self {
        Self::new(sysinfo::System::host_name().unwrap_or_else(|| "unknown".to_string()))
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Log a completed sample
    pub fn log_sample(&self, sample: &MetricSample, alert_count: usize) {
        info!(
            event = "sample_taken",
            host = %self.host_name,
            cpu_percent = sample.cpu_percent,
            memory_percent = sample.memory_percent,
            disk_percent = sample.disk_percent,
            alerts = alert_count,
            "Resource sample taken"
        );
    }

    /// Log a threshold breach
    pub fn log_threshold_breach(&self, alert: &AlertLine, threshold: f64) {
        warn!(
            event = "threshold_breached",
            host = %self.host_name,
            metric = %alert.metric,
            value = alert.value,
            threshold = threshold,
            "{}",
            alert
        );
    }

    /// Log a reading that aborted the invocation
    pub fn log_sampling_failure(&self, error: &SamplerError) {
        warn!(
            event = "sampling_failed",
            host = %self.host_name,
            error = %error,
            "Resource sampling failed, no record written"
        );
    }

    /// Log the outcome of a reachability probe
    pub fn log_probe(&self, checker: &str, passed: bool, output: &str, response_time_secs: f64) {
        if passed {
            info!(
                event = "probe_completed",
                host = %self.host_name,
                checker = %checker,
                passed = true,
                response_time_secs = response_time_secs,
                "{}",
                output
            );
        } else {
            warn!(
                event = "probe_completed",
                host = %self.host_name,
                checker = %checker,
                passed = false,
                response_time_secs = response_time_secs,
                "{}",
                output
            );
        }
    }

    /// Log agent startup
    pub fn log_startup(&self, version: &str, port: u16) {
        info!(
            event = "agent_started",
            host = %self.host_name,
            agent_version = %version,
            port = port,
            "Healthwatch agent started"
        );
    }

    /// Log agent shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            host = %self.host_name,
            reason = %reason,
            "Healthwatch agent shutting down"
        );
    }
}
