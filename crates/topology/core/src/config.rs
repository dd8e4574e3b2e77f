//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens to hosts whose attachment switch disconnects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrphanPolicy {
    /// Keep them as zero-degree nodes until their own leave or move.
    #[default]
    Retain,
    /// Drop them together with the switch.
    Remove,
}

/// Configuration for the topology service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TopologyConfig {
    /// Orphan host handling on switch disconnect.
    pub orphan_hosts: OrphanPolicy,
    /// Interval of the periodic state dump, in seconds. `None` or zero disables it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_interval_secs: Option<u64>,
    /// Republish a snapshot for [`TopologyReader`](crate::TopologyReader) after every mutation.
    pub publish_snapshots: bool,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            orphan_hosts: OrphanPolicy::Retain,
            debug_interval_secs: None,
            publish_snapshots: true,
        }
    }
}

impl TopologyConfig {
    pub fn debug_interval(&self) -> Option<Duration> {
        self.debug_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn with_orphan_hosts(mut self, policy: OrphanPolicy) -> Self {
        self.orphan_hosts = policy;
        self
    }

    pub fn with_debug_interval(mut self, interval: Duration) -> Self {
        self.debug_interval_secs = Some(interval.as_secs());
        self
    }

    pub fn with_publish_snapshots(mut self, enabled: bool) -> Self {
        self.publish_snapshots = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TopologyConfig::default();
        assert_eq!(config.orphan_hosts, OrphanPolicy::Retain);
        assert!(config.debug_interval().is_none());
        assert!(config.publish_snapshots);
    }

    #[test]
    fn test_zero_interval_disables_dump() {
        let config = TopologyConfig {
            debug_interval_secs: Some(0),
            ..Default::default()
        };
        assert!(config.debug_interval().is_none());

        let config = config.with_debug_interval(Duration::from_secs(10));
        assert_eq!(config.debug_interval(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: TopologyConfig =
            serde_json::from_str(r#"{"orphan-hosts":"remove"}"#).unwrap();
        assert_eq!(config.orphan_hosts, OrphanPolicy::Remove);
        assert!(config.publish_snapshots);
    }
}
