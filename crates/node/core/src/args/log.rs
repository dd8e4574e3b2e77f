//! Logging CLI arguments.

use clap::Args;
use serde::{Deserialize, Serialize};

/// Logging configuration.
#[derive(Debug, Args, Clone, Default, Serialize, Deserialize)]
#[command(next_help_heading = "Logging")]
#[serde(default)]
pub struct LogArgs {
    /// Silence all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    #[serde(skip)] // CLI-only, count action doesn't make sense in config
    pub verbosity: u8,

    /// Log filter directive (e.g., "dyntopo_topology=trace").
    #[arg(long = "log.filter", value_name = "DIRECTIVE", global = true)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json", global = true)]
    pub json: bool,
}

impl LogArgs {
    /// Level used when `RUST_LOG` is unset.
    pub fn base_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
