//! CLI argument structs.
//!
//! These args serve dual purposes:
//! - CLI parsing via clap (`#[derive(Args)]`)
//! - Configuration serialization via serde (`#[derive(Serialize, Deserialize)]`)

mod log;
mod topology;

pub use log::LogArgs;
pub use topology::{OrphanHostsArg, TopologyArgs};
