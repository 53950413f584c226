//! Queries against a running agent

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{color_status, print_json, print_table, OutputFormat};

/// Row for the health check results table
#[derive(Tabled, Serialize)]
struct CheckRow {
    #[tabled(rename = "Checker")]
    checker: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Output")]
    output: String,
    #[tabled(rename = "Response Time")]
    response_time: String,
    #[tabled(rename = "Checked At")]
    checked_at: String,
}

/// Show the agent's health report
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let report = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => {
            let status = serde_json::to_value(report.status)?;
            let status = status.as_str().unwrap_or("unknown");

            println!("{}", "Agent Health".bold());
            println!("{}", "=".repeat(50));
            println!("Host:       {}", report.hostname.cyan());
            println!("Status:     {}", color_status(status));
            println!("Checked At: {}", format_timestamp(report.timestamp));
            println!();

            let rows: Vec<CheckRow> = report
                .results
                .iter()
                .map(|result| CheckRow {
                    checker: result.checker.clone(),
                    status: color_status(if result.passed { "passed" } else { "failed" }),
                    output: result.output.clone(),
                    response_time: format!("{:.0}ms", result.response_time * 1000.0),
                    checked_at: format_timestamp(result.timestamp),
                })
                .collect();
            print_table(&rows, format);
        }
    }

    Ok(())
}

/// Show the agent's environment metadata
pub async fn show_environment(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let report = client.environment().await?;

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Table => {
            println!("{}", "Agent Environment".bold());
            println!("{}", "=".repeat(50));
            println!("Host:       {}", report.hostname.cyan());
            println!("Reported:   {}", format_timestamp(report.timestamp));
            println!();

            println!("{}", "Operating System".bold());
            println!("{}", "-".repeat(50));
            println!("Platform:   {}", report.os.platform);
            println!("Name:       {}", report.os.name.as_deref().unwrap_or("-"));
            println!("Release:    {}", report.os.release.as_deref().unwrap_or("-"));
            println!("Version:    {}", report.os.version.as_deref().unwrap_or("-"));
            println!("Arch:       {}", report.os.arch);
            println!();

            println!("{}", "Process".bold());
            println!("{}", "-".repeat(50));
            println!("PID:        {}", report.process.pid);
            println!("Version:    {}", report.process.version);
            println!("Command:    {}", report.process.argv.join(" "));
            println!("Directory:  {}", report.process.cwd.as_deref().unwrap_or("-"));
            println!();

            println!("{}", "Application".bold());
            println!("{}", "-".repeat(50));
            for (key, value) in &report.application {
                match value.as_str() {
                    Some(text) => println!("{:<11} {}", format!("{}:", key), text),
                    None => println!("{:<11} {}", format!("{}:", key), value),
                }
            }
        }
    }

    Ok(())
}

/// Format a Unix timestamp for display
fn format_timestamp(ts: i64) -> String {
    match chrono::DateTime::from_timestamp(ts, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => ts.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1714554303), "2024-05-01 09:05:03 UTC");
    }

    #[tokio::test]
    async fn test_show_health_against_agent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/healthcheck")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"hostname":"web-1","status":"success","timestamp":1714554303,
                    "results":[{"checker":"website_uptime","output":"aws.amazon.com is reachable",
                    "passed":true,"timestamp":1714554303,"expires":1714554330,"response_time":0.2}]}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        show_health(&client, OutputFormat::Table).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_show_environment_surfaces_agent_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/environment")
            .with_status(404)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        assert!(show_environment(&client, OutputFormat::Json).await.is_err());
    }
}
