//! Healthwatch agent - health check service and resource sampler
//!
//! Serves `/healthcheck`, `/environment` and `/metrics`. When enabled, also
//! samples host resources on a fixed interval and appends alert records to
//! the log file.

use agent_lib::{
    collector::{SamplingLoopBuilder, SysinfoProvider, DEFAULT_CPU_INTERVAL},
    Sampler, StructuredLogger,
};
use anyhow::Result;
use healthwatch_agent::{api, config};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting healthwatch-agent");

    // Load configuration
    let config = config::AgentConfig::load()?;
    info!(
        port = config.port,
        probe_url = %config.probe_url,
        sampler_enabled = config.sampler_enabled,
        "Agent configured"
    );

    let logger = StructuredLogger::for_local_host();
    logger.log_startup(AGENT_VERSION, config.port);

    // Create shared application state
    let app_state = Arc::new(api::AppState::from_config(
        &config,
        AGENT_VERSION,
        logger.clone(),
    )?);

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Bind before spawning so a taken port fails startup
    let listener = api::bind(config.port).await?;

    // Start health, environment and metrics server
    let mut api_shutdown = shutdown_tx.subscribe();
    let mut api_handle = tokio::spawn(api::serve(listener, app_state, async move {
        let _ = api_shutdown.recv().await;
    }));

    // Start the sampling loop if requested
    let sampler_handle = if config.sampler_enabled {
        let sampler = Sampler::new(
            SysinfoProvider::new(DEFAULT_CPU_INTERVAL),
            config.sampler_config(),
        )
        .with_logger(logger.clone());

        let sampling_loop = SamplingLoopBuilder::new()
            .sampler(sampler)
            .interval(config.sample_interval())
            .build()?;

        Some(tokio::spawn(sampling_loop.run(shutdown_tx.subscribe())))
    } else {
        None
    };

    // Wait for Ctrl+C, or for the server to stop on its own
    let server_stopped = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
            false
        }
        result = &mut api_handle => {
            match result {
                Ok(Ok(())) => error!("API server stopped unexpectedly"),
                Ok(Err(e)) => error!(error = %e, "API server exited with error"),
                Err(e) => error!(error = %e, "API server task failed"),
            }
            logger.log_shutdown("API server stopped");
            true
        }
    };

    let _ = shutdown_tx.send(());

    if let Some(handle) = sampler_handle {
        match handle.await {
            Ok(runs) => info!(runs = runs, "Sampling loop stopped"),
            Err(e) => error!(error = %e, "Sampling loop task failed"),
        }
    }

    if server_stopped {
        anyhow::bail!("API server stopped before shutdown was requested");
    }

    match api_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "API server exited with error"),
        Err(e) => error!(error = %e, "API server task failed"),
    }

    info!("Shutting down");

    Ok(())
}
