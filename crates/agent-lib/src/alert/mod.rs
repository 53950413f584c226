//! Threshold alerting and the append-only log file
//!
//! This module provides:
//! - Threshold evaluation of a metric sample into alert lines
//! - Log record construction (timestamp plus alerts, one line per run)
//! - Appending records to the log file with scoped file handles

mod log_file;
mod record;

pub use log_file::{append_logged, append_record, write_log_record, LogWriteError, DEFAULT_LOG_PATH};
pub use record::{
    build_log_record, format_percent, validate_threshold, AlertLine, AlertThresholds, InvalidThreshold,
    LogRecord, DEFAULT_THRESHOLD, TIMESTAMP_FORMAT,
};
