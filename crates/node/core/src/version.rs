//! Version information.

/// The version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name and version, as shown in the startup log line.
pub const NAME_VERSION: &str = concat!("dyntopo/v", env!("CARGO_PKG_VERSION"));
