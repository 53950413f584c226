//! CLI subcommand implementations

pub mod agent;
pub mod probe;
pub mod sample;
pub mod top;
