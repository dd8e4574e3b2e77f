//! Recorded control-event traces.
//!
//! A trace is a TOML file with one `[[event]]` table per event, tagged by `kind`:
//!
//! ```toml
//! [[event]]
//! kind = "switch-connected"
//! dpid = "00-00-00-00-00-01"
//!
//! [[event]]
//! kind = "link-added"
//! dpid1 = "1"
//! port1 = 1
//! dpid2 = "2"
//! port2 = 1
//!
//! [[event]]
//! kind = "host-joined"
//! mac = "00:00:00:00:00:01"
//! dpid = "1"
//! port = 3
//! ips = ["10.0.0.1"]
//! ```
//!
//! Datapath ids are strings in any form [`Dpid`] parses.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::net::IpAddr;
use std::path::Path;

use dyntopo_primitives::{Dpid, HostLocation, MacAddr, PortNo};
use dyntopo_topology::{HostEvent, LinkEvent, TopologyEvent};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TraceEvent {
    SwitchConnected {
        dpid: Dpid,
    },
    SwitchDisconnected {
        dpid: Dpid,
    },
    LinkAdded {
        dpid1: Dpid,
        port1: PortNo,
        dpid2: Dpid,
        port2: PortNo,
    },
    LinkRemoved {
        dpid1: Dpid,
        port1: PortNo,
        dpid2: Dpid,
        port2: PortNo,
    },
    /// Join or move.
    HostJoined {
        mac: MacAddr,
        dpid: Dpid,
        port: PortNo,
        #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
        ips: BTreeSet<IpAddr>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        metadata: BTreeMap<String, String>,
    },
    /// The last known attachment is optional; the engine only needs the MAC.
    HostLeft {
        mac: MacAddr,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dpid: Option<Dpid>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        port: Option<PortNo>,
    },
}

impl From<TraceEvent> for TopologyEvent {
    fn from(event: TraceEvent) -> Self {
        match event {
            TraceEvent::SwitchConnected { dpid } => Self::switch_connected(dpid),
            TraceEvent::SwitchDisconnected { dpid } => Self::switch_disconnected(dpid),
            TraceEvent::LinkAdded {
                dpid1,
                port1,
                dpid2,
                port2,
            } => LinkEvent::added(dpid1, port1, dpid2, port2).into(),
            TraceEvent::LinkRemoved {
                dpid1,
                port1,
                dpid2,
                port2,
            } => LinkEvent::removed(dpid1, port1, dpid2, port2).into(),
            TraceEvent::HostJoined {
                mac,
                dpid,
                port,
                ips,
                metadata,
            } => {
                let mut location = HostLocation::new(dpid, port).with_ips(ips);
                location.metadata = metadata;
                HostEvent::join(mac, location).into()
            }
            TraceEvent::HostLeft { mac, dpid, port } => {
                // A leave is keyed by MAC only; a placeholder location for an omitted one is never read.
                let location = HostLocation::new(dpid.unwrap_or_default(), port.unwrap_or_default());
                HostEvent::leave(mac, location).into()
            }
        }
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SwitchConnected { dpid } => write!(f, "switch {dpid} connected"),
            Self::SwitchDisconnected { dpid } => write!(f, "switch {dpid} disconnected"),
            Self::LinkAdded {
                dpid1,
                port1,
                dpid2,
                port2,
            } => write!(f, "link {dpid1}.{port1} <-> {dpid2}.{port2} added"),
            Self::LinkRemoved {
                dpid1,
                port1,
                dpid2,
                port2,
            } => write!(f, "link {dpid1}.{port1} <-> {dpid2}.{port2} removed"),
            Self::HostJoined {
                mac, dpid, port, ..
            } => write!(f, "host {mac} at {dpid}.{port}"),
            Self::HostLeft { mac, .. } => write!(f, "host {mac} left"),
        }
    }
}

/// An ordered list of recorded events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(rename = "event", default)]
    pub events: Vec<TraceEvent>,
}

impl Trace {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read trace {}", path.display()))?;
        Self::from_toml(&content).wrap_err_with(|| format!("failed to parse trace {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
