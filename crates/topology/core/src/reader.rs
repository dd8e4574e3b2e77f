//! Shared, whole-snapshot read access.

use std::collections::BTreeSet;
use std::sync::Arc;

use dyntopo_primitives::{Dpid, EntityId, HostLocation, MacAddr, PortNo};
use parking_lot::RwLock;

use crate::view::{TopologySnapshot, TopologyView};

/// Latest snapshot published by the service.
///
/// The service swaps the whole `Arc` in one write, so a reader sees either the state before
/// an event or the state after it, never a mix.
#[derive(Debug, Clone, Default)]
pub struct TopologyReader {
    current: Arc<RwLock<Arc<TopologySnapshot>>>,
}

impl TopologyReader {
    /// The most recently published snapshot.
    pub fn current(&self) -> Arc<TopologySnapshot> {
        Arc::clone(&self.current.read())
    }

    pub(crate) fn publish(&self, snapshot: TopologySnapshot) {
        *self.current.write() = Arc::new(snapshot);
    }
}

impl TopologyView for TopologyReader {
    fn list_switches(&self) -> Vec<Dpid> {
        self.current().list_switches()
    }

    fn list_hosts(&self) -> Vec<MacAddr> {
        self.current().list_hosts()
    }

    fn neighbors(&self, id: &EntityId) -> BTreeSet<EntityId> {
        self.current().neighbors(id)
    }

    fn port_of(&self, switch: Dpid, neighbor: &EntityId) -> Option<PortNo> {
        self.current().port_of(switch, neighbor)
    }

    fn host_location(&self, mac: MacAddr) -> Option<HostLocation> {
        self.current().host_location(mac)
    }

    fn snapshot(&self) -> TopologySnapshot {
        self.current().as_ref().clone()
    }
}
