//! Node infrastructure around the topology engine.
//!
//! - [`args`] - CLI argument structs (clap + serde)
//! - [`config`] - TOML configuration loading and CLI overrides
//! - [`logging`] - Logging initialization
//! - [`trace`] - Recorded event traces
//! - [`replay`] - Feeding a trace through the topology actor
//! - [`version`] - Version information

pub mod args;
pub mod config;
pub mod logging;
pub mod replay;
pub mod trace;
pub mod version;
