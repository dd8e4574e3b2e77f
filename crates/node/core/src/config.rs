//! Configuration file handling.

use std::fs;
use std::path::Path;

use dyntopo_topology::TopologyConfig;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::args::TopologyArgs;

/// Contents of a `dyntopo.toml` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Topology engine settings.
    pub topology: TopologyConfig,
}

impl NodeConfig {
    /// Loads the configuration from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .wrap_err_with(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the configuration to the given path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Apply command line arguments to override the configuration.
    pub fn apply_args(&mut self, args: &TopologyArgs) {
        if let Some(policy) = args.orphan_hosts {
            self.topology.orphan_hosts = policy.into();
        }
        if let Some(secs) = args.debug_interval {
            self.topology.debug_interval_secs = Some(secs);
        }
        if args.no_publish {
            self.topology.publish_snapshots = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::OrphanHostsArg;
    use dyntopo_topology::OrphanPolicy;

    #[test]
    fn test_load_defaults_without_path() {
        let config = NodeConfig::load(None).unwrap();
        assert_eq!(config, NodeConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let config = NodeConfig::from_toml(
            r#"
            [topology]
            orphan-hosts = "remove"
            debug-interval-secs = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.topology.orphan_hosts, OrphanPolicy::Remove);
        assert_eq!(config.topology.debug_interval_secs, Some(10));
        assert!(config.topology.publish_snapshots);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        assert!(NodeConfig::from_toml("[topology]\norphan-hosts = \"keep\"\n").is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dyntopo.toml");

        let mut config = NodeConfig::default();
        config.topology.debug_interval_secs = Some(30);
        config.save(&path).unwrap();

        assert_eq!(NodeConfig::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = NodeConfig::load(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("absent.toml"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = NodeConfig::from_toml("[topology]\ndebug-interval-secs = 5\n").unwrap();
        config.apply_args(&TopologyArgs {
            orphan_hosts: Some(OrphanHostsArg::Remove),
            debug_interval: None,
            no_publish: true,
        });
        assert_eq!(config.topology.orphan_hosts, OrphanPolicy::Remove);
        assert_eq!(config.topology.debug_interval_secs, Some(5));
        assert!(!config.topology.publish_snapshots);
    }
}
