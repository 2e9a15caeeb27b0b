//! Ambient helpers shared by the stub runner, the consumer harness and the CLI.

pub mod config;
pub mod tracing;
