//! Agent library for host resource monitoring
//!
//! This crate provides the core functionality for:
//! - Sampling CPU, memory and disk utilization
//! - Threshold alerting into an append-only log file
//! - Listing the top process memory consumers
//! - Website reachability probes and health check aggregation
//! - Environment metadata and observability

pub mod alert;
pub mod collector;
pub mod environment;
pub mod health;
pub mod models;
pub mod observability;
pub mod probe;
pub mod sampler;

pub use alert::{build_log_record, write_log_record, AlertLine, AlertThresholds, LogRecord};
pub use collector::{MetricsProvider, SamplerError, SysinfoProvider};
pub use environment::{EnvironmentDump, EnvironmentReport};
pub use health::{CheckOutcome, CheckResult, Checker, HealthCheck, HealthReport, HealthStatus};
pub use models::*;
pub use observability::{MonitorMetrics, StructuredLogger};
pub use probe::ReachabilityProbe;
pub use sampler::{RunOutcome, SampleReport, Sampler, SamplerConfig};
