//! Healthwatch agent
//!
//! HTTP service exposing a website reachability health check, environment
//! metadata and Prometheus metrics, with an optional in-process resource
//! sampler.

pub mod api;
pub mod config;
