//! Topology engine CLI arguments.

use clap::{Args, ValueEnum};
use dyntopo_topology::OrphanPolicy;
use serde::{Deserialize, Serialize};

/// `--orphan-hosts` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrphanHostsArg {
    /// Keep hosts of a disconnected switch as unattached nodes.
    Retain,
    /// Drop hosts together with their switch.
    Remove,
}

impl From<OrphanHostsArg> for OrphanPolicy {
    fn from(arg: OrphanHostsArg) -> Self {
        match arg {
            OrphanHostsArg::Retain => Self::Retain,
            OrphanHostsArg::Remove => Self::Remove,
        }
    }
}

/// Overrides for the `[topology]` config section. Unset flags keep the file's values.
#[derive(Debug, Args, Clone, Default, Serialize, Deserialize)]
#[command(next_help_heading = "Topology")]
#[serde(default)]
pub struct TopologyArgs {
    /// What to do with hosts whose switch disconnects.
    #[arg(long = "orphan-hosts", value_enum, value_name = "POLICY")]
    pub orphan_hosts: Option<OrphanHostsArg>,

    /// Log the whole topology every N seconds (0 disables).
    #[arg(long = "debug-interval", value_name = "SECS", env = "DYNTOPO_DEBUG_INTERVAL")]
    pub debug_interval: Option<u64>,

    /// Do not republish snapshots for concurrent readers.
    #[arg(long = "no-publish")]
    pub no_publish: bool,
}
