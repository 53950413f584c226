//! Top process memory consumers

use agent_lib::collector::ProcessLister;
use agent_lib::ProcessUsage;
use anyhow::{Context, Result};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{format_bytes, format_percent, print_table, OutputFormat};

/// Row for the process table
#[derive(Tabled, Serialize)]
pub struct ProcessRow {
    #[tabled(rename = "PID")]
    pid: u32,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Memory %")]
    memory_percent: String,
}

impl From<&ProcessUsage> for ProcessRow {
    fn from(usage: &ProcessUsage) -> Self {
        Self {
            pid: usage.pid,
            name: usage.name.clone(),
            user: usage.user.clone().unwrap_or_else(|| "-".to_string()),
            memory: format_bytes(usage.memory_bytes),
            memory_percent: format_percent(usage.memory_percent),
        }
    }
}

/// Read the process table on a blocking thread
pub async fn collect_top_processes(limit: usize) -> Result<Vec<ProcessUsage>> {
    tokio::task::spawn_blocking(move || ProcessLister::new().top_memory_consumers(limit))
        .await
        .context("Process listing task failed")
}

/// Print processes as a table or as raw JSON
pub fn print_processes(processes: &[ProcessUsage], format: OutputFormat) {
    match format {
        OutputFormat::Json => crate::output::print_json(processes),
        OutputFormat::Table => {
            let rows: Vec<ProcessRow> = processes.iter().map(ProcessRow::from).collect();
            print_table(&rows, format);
        }
    }
}

/// List the processes using the most memory
pub async fn show_top(limit: usize, format: OutputFormat) -> Result<()> {
    let processes = collect_top_processes(limit).await?;
    print_processes(&processes, format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_from_usage() {
        let usage = ProcessUsage {
            pid: 4242,
            name: "postgres".to_string(),
            user: None,
            memory_bytes: 2 * 1024 * 1024,
            memory_percent: 12.345,
        };

        let row = ProcessRow::from(&usage);

        assert_eq!(row.pid, 4242);
        assert_eq!(row.user, "-");
        assert_eq!(row.memory, "2.00Mi");
        assert_eq!(row.memory_percent, "12.3%");
    }
}
