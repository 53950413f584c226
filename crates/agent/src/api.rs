//! HTTP API for health checks, environment metadata and Prometheus metrics

use crate::config::AgentConfig;
use agent_lib::{
    EnvironmentDump, HealthCheck, MonitorMetrics, ReachabilityProbe, StructuredLogger,
};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health: HealthCheck,
    pub environment: EnvironmentDump,
    pub metrics: MonitorMetrics,
}

impl AppState {
    pub fn new(health: HealthCheck, environment: EnvironmentDump, metrics: MonitorMetrics) -> Self {
        Self {
            health,
            environment,
            metrics,
        }
    }

    /// Wire the website probe and environment metadata from configuration
    pub fn from_config(
        config: &AgentConfig,
        version: &str,
        logger: StructuredLogger,
    ) -> Result<Self> {
        let probe = ReachabilityProbe::new(&config.probe_url, config.probe_timeout())?;

        let health = HealthCheck::new()
            .with_ttls(
                Duration::from_secs(config.success_ttl_secs),
                Duration::from_secs(config.failed_ttl_secs),
            )
            .with_logger(logger)
            .with_checker(Arc::new(probe));

        let environment = EnvironmentDump::new(version)
            .with_entry("maintainer", config.maintainer.clone())
            .with_entry("git_owner", config.git_owner.clone());

        Ok(Self::new(health, environment, MonitorMetrics::new()))
    }
}

/// Health check response. Always 200: a failed probe is reported in the body.
async fn healthcheck(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = state.health.run().await;
    (StatusCode::OK, Json(report))
}

/// Environment metadata response
async fn environment(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.environment.report()))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            Vec::new(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/environment", get(environment))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Bind the API listener on all interfaces
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = format!("0.0.0.0:{}", port);
    TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind API server on {}", addr))
}

/// Serve the API on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "Starting API server");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
