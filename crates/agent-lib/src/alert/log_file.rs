//! Append-only log file
//!
//! Every write opens the file in append mode, writes one line and lets the
//! handle drop, so the file is closed on every return path.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

/// Default log file, relative to the working directory
pub const DEFAULT_LOG_PATH: &str = "system-logs.txt";

/// Failure to persist a log record
#[derive(Debug, Error)]
#[error("cannot append to log file {}: {source}", .path.display())]
pub struct LogWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Append `record` plus a newline to `log_path`, creating the file if absent
pub fn append_record(record: &str, log_path: &Path) -> Result<(), LogWriteError> {
    let wrap = |source| LogWriteError {
        path: log_path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(wrap)?;

    // Single write so the line lands in one append
    let line = format!("{}\n", record);
    file.write_all(line.as_bytes()).map_err(wrap)?;
    file.flush().map_err(wrap)?;

    Ok(())
}

/// Append `record` to `log_path` and log the outcome
pub fn append_logged(record: &str, log_path: &Path) -> Result<(), LogWriteError> {
    let result = append_record(record, log_path);
    match &result {
        Ok(()) => info!(path = %log_path.display(), "Log record written"),
        Err(e) => error!(
            event = "log_write_failed",
            path = %log_path.display(),
            error = %e,
            "Cannot write log record"
        ),
    }
    result
}

/// Append `record` to `log_path`, reporting failures instead of returning them.
///
/// Returns `true` when the line was written.
pub fn write_log_record(record: &str, log_path: &Path) -> bool {
    append_logged(record, log_path).is_ok()
}
