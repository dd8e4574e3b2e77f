//! Host attachment records.

use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;

use crate::dpid::Dpid;
use crate::entity::PortNo;

/// Where a host was last seen, as reported by the host-location tracker.
///
/// `metadata` carries whatever else the tracker attaches; it is stored and handed back
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HostLocation {
    pub dpid: Dpid,
    pub port: PortNo,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ip_addrs: BTreeSet<IpAddr>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "BTreeMap::is_empty")
    )]
    pub metadata: BTreeMap<String, String>,
}

impl HostLocation {
    pub fn new(dpid: Dpid, port: PortNo) -> Self {
        Self {
            dpid,
            port,
            ip_addrs: BTreeSet::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip_addrs.insert(ip);
        self
    }

    pub fn with_ips(mut self, ips: impl IntoIterator<Item = IpAddr>) -> Self {
        self.ip_addrs.extend(ips);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The `(switch, port)` attachment point.
    pub fn attachment(&self) -> (Dpid, PortNo) {
        (self.dpid, self.port)
    }
}
