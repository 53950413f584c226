//! Website reachability probe

use agent_lib::ReachabilityProbe;
use anyhow::Result;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::output::{print_error, print_json, print_success, OutputFormat};

#[derive(Serialize)]
struct ProbeOutput<'a> {
    url: &'a str,
    passed: bool,
    output: &'a str,
    response_time: f64,
}

/// Probe `url` once. Returns whether the site answered 200.
pub async fn run_probe(url: &str, timeout: Duration, format: OutputFormat) -> Result<bool> {
    let probe = ReachabilityProbe::new(url, timeout)?;

    let start = Instant::now();
    let outcome = probe.probe().await;
    let elapsed = start.elapsed().as_secs_f64();

    match format {
        OutputFormat::Json => print_json(&ProbeOutput {
            url: probe.url().as_str(),
            passed: outcome.passed,
            output: &outcome.output,
            response_time: elapsed,
        }),
        OutputFormat::Table => {
            let message = format!("{} ({:.0}ms)", outcome.output, elapsed * 1000.0);
            if outcome.passed {
                print_success(&message);
            } else {
                print_error(&message);
            }
        }
    }

    Ok(outcome.passed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_reports_pass_and_fail() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server.mock("GET", "/up").with_status(200).create_async().await;
        let _down = server.mock("GET", "/down").with_status(503).create_async().await;

        let timeout = Duration::from_secs(2);
        let up = run_probe(&format!("{}/up", server.url()), timeout, OutputFormat::Json).await;
        let down = run_probe(&format!("{}/down", server.url()), timeout, OutputFormat::Json).await;

        assert!(up.unwrap());
        assert!(!down.unwrap());
    }

    #[tokio::test]
    async fn test_probe_rejects_invalid_url() {
        let result = run_probe("not a url", Duration::from_secs(1), OutputFormat::Table).await;
        assert!(result.is_err());
    }
}
