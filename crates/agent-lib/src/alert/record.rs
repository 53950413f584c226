//! Log record construction
//!
//! A record holds one timestamp entry and one alert line for every metric
//! strictly above its threshold, in the order CPU, Memory, Disk. It renders
//! as a single line of the form
//! `['Timestamp: 2024-05-01 10:00:00', 'CPU Usage Alert: 95.0%']`.

use crate::models::{Metric, MetricSample};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default alert threshold in percent
pub const DEFAULT_THRESHOLD: f64 = 80.0;

/// Timestamp layout used in log records
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Threshold that cannot be compared against a percentage
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("alert threshold {0} is not a percentage between 0 and 100")]
pub struct InvalidThreshold(pub f64);

/// Accept only finite thresholds within 0-100. A NaN threshold would never
/// be exceeded and would silence every alert.
pub fn validate_threshold(threshold: f64) -> Result<f64, InvalidThreshold> {
    if threshold.is_finite() && (0.0..=100.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(InvalidThreshold(threshold))
    }
}

/// Per-metric alert thresholds. A value alerts only when strictly above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self::uniform(DEFAULT_THRESHOLD)
    }
}

impl AlertThresholds {
    /// Same threshold for every metric
    pub fn uniform(threshold: f64) -> Self {
        Self {
            cpu: threshold,
            memory: threshold,
            disk: threshold,
        }
    }

    pub fn for_metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Cpu => self.cpu,
            Metric::Memory => self.memory,
            Metric::Disk => self.disk,
        }
    }

    pub fn is_breached(&self, metric: Metric, value: f64) -> bool {
        value > self.for_metric(metric)
    }
}

/// One threshold breach
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertLine {
    pub metric: Metric,
    pub value: f64,
}

impl fmt::Display for AlertLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Usage Alert: {}%", self.metric, format_percent(self.value))
    }
}

/// Everything one sampling run writes to the log file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    timestamp: NaiveDateTime,
    alerts: Vec<AlertLine>,
}

impl LogRecord {
    /// Evaluate `sample` against `thresholds`
    pub fn from_sample(sample: &MetricSample, thresholds: &AlertThresholds) -> Self {
        let alerts = Metric::ALL
            .iter()
            .map(|&metric| AlertLine {
                metric,
                value: sample.value(metric),
            })
            .filter(|alert| thresholds.is_breached(alert.metric, alert.value))
            .collect();

        Self {
            timestamp: sample.timestamp,
            alerts,
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn alerts(&self) -> &[AlertLine] {
        &self.alerts
    }

    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }

    /// Entries in write order: the timestamp, then each alert
    pub fn entries(&self) -> Vec<String> {
        let mut entries = Vec::with_capacity(self.alerts.len() + 1);
        entries.push(format!("Timestamp: {}", self.timestamp.format(TIMESTAMP_FORMAT)));
        entries.extend(self.alerts.iter().map(ToString::to_string));
        entries
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self
            .entries()
            .iter()
            .map(|entry| format!("'{}'", entry))
            .collect();
        write!(f, "[{}]", quoted.join(", "))
    }
}

/// Build the log line for one set of readings using the default threshold
pub fn build_log_record(cpu: f64, memory: f64, disk: f64, now: NaiveDateTime) -> String {
    let sample = MetricSample::new(cpu, memory, disk, now);
    LogRecord::from_sample(&sample, &AlertThresholds::default()).to_string()
}

/// Render a percentage with at least one decimal place (`95.0`, `80.01`)
pub fn format_percent(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_threshold_rejects_non_percentages() {
        assert_eq!(validate_threshold(80.0), Ok(80.0));
        assert_eq!(validate_threshold(0.0), Ok(0.0));
        assert_eq!(validate_threshold(100.0), Ok(100.0));
        assert!(validate_threshold(f64::NAN).is_err());
        assert!(validate_threshold(f64::INFINITY).is_err());
        assert!(validate_threshold(-1.0).is_err());
        assert!(validate_threshold(150.0).is_err());
    }
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 5, 3)
            .unwrap()
    }

    #[test]
    fn test_cpu_only_alert() {
        let line = build_log_record(95.0, 50.0, 10.0, at());

        assert_eq!(
            line,
            "['Timestamp: 2024-05-01 09:05:03', 'CPU Usage Alert: 95.0%']"
        );
        assert!(!line.contains("Memory"));
        assert!(!line.contains("Disk"));
    }

    #[test]
    fn test_no_alerts_leaves_only_timestamp() {
        let line = build_log_record(10.0, 10.0, 10.0, at());

        assert_eq!(line, "['Timestamp: 2024-05-01 09:05:03']");
        assert!(!line.contains("Usage Alert"));
    }

    #[test]
    fn test_threshold_is_strictly_greater() {
        let line = build_log_record(80.0, 80.0, 80.0, at());
        assert!(!line.contains("Usage Alert"));

        let line = build_log_record(80.01, 10.0, 10.0, at());
        assert!(line.contains("CPU Usage Alert: 80.01%"));
    }

    #[test]
    fn test_all_alerts_in_fixed_order() {
        let line = build_log_record(81.0, 92.5, 99.9, at());

        let cpu = line.find("CPU Usage Alert: 81.0%").unwrap();
        let memory = line.find("Memory Usage Alert: 92.5%").unwrap();
        let disk = line.find("Disk Usage Alert: 99.9%").unwrap();
        assert!(cpu < memory && memory < disk);
        assert_eq!(line.matches("Timestamp: ").count(), 1);
    }

    #[test]
    fn test_alert_present_iff_above_threshold() {
        let values = [0.0, 42.0, 79.99, 80.0, 80.01, 85.5, 100.0];

        for &cpu in &values {
            for &memory in &values {
                let sample = MetricSample::new(cpu, memory, 50.0, at());
                let record = LogRecord::from_sample(&sample, &AlertThresholds::default());
                let metrics: Vec<Metric> = record.alerts().iter().map(|a| a.metric).collect();

                assert_eq!(metrics.contains(&Metric::Cpu), cpu > 80.0, "cpu={}", cpu);
                assert_eq!(metrics.contains(&Metric::Memory), memory > 80.0, "memory={}", memory);
                assert!(!metrics.contains(&Metric::Disk));
            }
        }
    }

    #[test]
    fn test_custom_thresholds_per_metric() {
        let thresholds = AlertThresholds {
            cpu: 50.0,
            memory: 90.0,
            disk: 95.0,
        };
        let sample = MetricSample::new(60.0, 85.0, 96.0, at());

        let record = LogRecord::from_sample(&sample, &thresholds);

        let metrics: Vec<Metric> = record.alerts().iter().map(|a| a.metric).collect();
        assert_eq!(metrics, vec![Metric::Cpu, Metric::Disk]);
        assert!(record.has_alerts());
    }

    #[test]
    fn test_entries_keep_timestamp_first() {
        let sample = MetricSample::new(10.0, 88.0, 10.0, at());
        let record = LogRecord::from_sample(&sample, &AlertThresholds::default());

        assert_eq!(
            record.entries(),
            vec![
                "Timestamp: 2024-05-01 09:05:03".to_string(),
                "Memory Usage Alert: 88.0%".to_string(),
            ]
        );
        assert_eq!(record.timestamp(), at());
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(95.0), "95.0");
        assert_eq!(format_percent(80.01), "80.01");
        assert_eq!(format_percent(100.0), "100.0");
        assert_eq!(format_percent(12.3), "12.3");
    }
}
