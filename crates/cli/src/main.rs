//! healthwatch CLI
//!
//! Samples host CPU, memory and disk usage into the alert log, lists the
//! heaviest processes, probes websites and queries a running agent.

mod client;
mod commands;
mod config;
mod output;

use agent_lib::alert::{validate_threshold, AlertThresholds};
use agent_lib::collector::{DEFAULT_CPU_INTERVAL, DEFAULT_SAMPLE_INTERVAL, DEFAULT_TOP_PROCESSES};
use agent_lib::probe::{DEFAULT_PROBE_TIMEOUT, DEFAULT_PROBE_URL};
use agent_lib::SamplerConfig;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use commands::{agent, probe, sample, top};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// healthwatch CLI
#[derive(Parser)]
#[command(name = "healthwatch")]
#[command(author, version, about = "Host resource sampler and health probe", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by `sample` and `watch`
#[derive(Args, Debug, Clone)]
pub struct SamplingArgs {
    /// Log file that records are appended to
    #[arg(long, env = "HEALTHWATCH_LOG_PATH")]
    pub log_file: Option<PathBuf>,

    /// Path whose filesystem usage is sampled
    #[arg(long, env = "HEALTHWATCH_DISK_PATH")]
    pub disk_path: Option<PathBuf>,

    /// Alert when a usage percentage is strictly above this value
    #[arg(long, env = "HEALTHWATCH_THRESHOLD", value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// CPU measurement window in milliseconds
    #[arg(long, default_value_t = DEFAULT_CPU_INTERVAL.as_millis() as u64)]
    pub cpu_interval_ms: u64,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sample usage once and append a record to the log file
    Sample {
        #[command(flatten)]
        sampling: SamplingArgs,

        /// Also list the top N processes by memory (0 to skip)
        #[arg(long, default_value_t = DEFAULT_TOP_PROCESSES)]
        top: usize,
    },

    /// Sample periodically until interrupted
    Watch {
        #[command(flatten)]
        sampling: SamplingArgs,

        /// Seconds between samples
        #[arg(long, default_value_t = DEFAULT_SAMPLE_INTERVAL.as_secs())]
        interval: u64,
    },

    /// List the processes using the most memory
    Top {
        /// Number of processes to show
        #[arg(long, short, default_value_t = DEFAULT_TOP_PROCESSES)]
        limit: usize,
    },

    /// Check that a website answers with 200 OK
    Probe {
        /// URL to request
        #[arg(long, env = "HEALTHWATCH_PROBE_URL", default_value = DEFAULT_PROBE_URL)]
        url: String,

        /// Request timeout in seconds
        #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT.as_secs())]
        timeout: u64,
    },

    /// Query a running agent
    Agent {
        /// Agent endpoint URL
        #[arg(long, env = "HEALTHWATCH_AGENT_URL")]
        agent_url: Option<String>,

        #[command(subcommand)]
        command: AgentCommands,
    },
}

#[derive(Subcommand)]
pub enum AgentCommands {
    /// Show the aggregated health report
    Health,

    /// Show host, process and application metadata
    Environment,
}

fn parse_threshold(value: &str) -> Result<f64, String> {
    let threshold: f64 = value.parse().map_err(|e| format!("{}", e))?;
    validate_threshold(threshold).map_err(|e| e.to_string())
}

impl SamplingArgs {
    fn into_options(self, config: &config::Config) -> Result<sample::SampleOptions> {
        let threshold = validate_threshold(config.threshold(self.threshold))
            .context("Invalid threshold in config file")?;

        Ok(sample::SampleOptions {
            config: SamplerConfig {
                log_path: config.log_file(self.log_file),
                disk_path: config.disk_path(self.disk_path),
                thresholds: AlertThresholds::uniform(threshold),
            },
            cpu_interval: Duration::from_millis(self.cpu_interval_ms),
        })
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if matches!(cli.command, Commands::Watch { .. }) {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = config::Config::load()?;
    debug!(?config, "Loaded CLI configuration");

    let success = match cli.command {
        Commands::Sample { sampling, top } => {
            sample::run_sample(sampling.into_options(&config)?, top, cli.format).await?
        }
        Commands::Watch { sampling, interval } => {
            sample::watch(sampling.into_options(&config)?, Duration::from_secs(interval)).await?;
            true
        }
        Commands::Top { limit } => {
            top::show_top(limit, cli.format).await?;
            true
        }
        Commands::Probe { url, timeout } => {
            probe::run_probe(&url, Duration::from_secs(timeout), cli.format).await?
        }
        Commands::Agent { agent_url, command } => {
            let client = client::ApiClient::new(&config.agent_url(agent_url))?;
            match command {
                AgentCommands::Health => agent::show_health(&client, cli.format).await?,
                AgentCommands::Environment => agent::show_environment(&client, cli.format).await?,
            }
            true
        }
    };

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
