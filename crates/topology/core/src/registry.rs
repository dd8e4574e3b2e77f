//! Canonical set of known switches and hosts.
//!
//! The registry knows nothing about the adjacency graph; keeping the two in agreement is the
//! processor's job.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use dyntopo_primitives::{ConnectionHandle, Dpid, EntityId, HostLocation, MacAddr, PortNo};

use crate::error::{Result, TopologyError};

/// A connected switch and what sits behind each of its ports.
#[derive(Debug, Clone)]
pub struct Switch {
    dpid: Dpid,
    connection: ConnectionHandle,
    ports: BTreeMap<PortNo, EntityId>,
}

impl Switch {
    fn new(dpid: Dpid, connection: ConnectionHandle) -> Self {
        Self {
            dpid,
            connection,
            ports: BTreeMap::new(),
        }
    }

    pub fn dpid(&self) -> Dpid {
        self.dpid
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    pub fn ports(&self) -> &BTreeMap<PortNo, EntityId> {
        &self.ports
    }

    pub fn neighbor_at(&self, port: PortNo) -> Option<EntityId> {
        self.ports.get(&port).copied()
    }

    /// First port pointing at `neighbor`.
    ///
    /// With several such ports the choice is unspecified. Today it is the lowest port number,
    /// but callers must not rely on that.
    pub fn port_to(&self, neighbor: &EntityId) -> Option<PortNo> {
        self.ports
            .iter()
            .find_map(|(port, id)| (id == neighbor).then_some(*port))
    }

    pub fn has_port_to(&self, neighbor: &EntityId) -> bool {
        self.ports.values().any(|id| id == neighbor)
    }
}

/// A host and its latest reported location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    mac: MacAddr,
    location: HostLocation,
}

impl Host {
    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    pub fn location(&self) -> &HostLocation {
        &self.location
    }
}

/// Switch and host tables.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    switches: HashMap<Dpid, Switch>,
    hosts: HashMap<MacAddr, Host>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_switch(&mut self, dpid: Dpid, connection: ConnectionHandle) -> Result<&Switch> {
        match self.switches.entry(dpid) {
            Entry::Occupied(_) => Err(TopologyError::DuplicateEntity(dpid.into())),
            Entry::Vacant(slot) => Ok(slot.insert(Switch::new(dpid, connection))),
        }
    }

    /// Removes the switch. Graph cleanup is left to the caller.
    pub fn remove_switch(&mut self, dpid: Dpid) -> Result<Switch> {
        self.switches
            .remove(&dpid)
            .ok_or(TopologyError::UnknownEntity(dpid.into()))
    }

    /// Records `location` for `mac`, replacing any previous record wholesale.
    pub fn add_host(&mut self, mac: MacAddr, location: HostLocation) -> &Host {
        let host = Host { mac, location };
        match self.hosts.entry(mac) {
            Entry::Occupied(mut slot) => {
                slot.insert(host);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(host),
        }
    }

    pub fn remove_host(&mut self, mac: MacAddr) -> Result<Host> {
        self.hosts
            .remove(&mac)
            .ok_or(TopologyError::UnknownEntity(mac.into()))
    }

    /// Points `port` of `dpid` at `neighbor`, returning whatever was there before.
    pub fn set_port(
        &mut self,
        dpid: Dpid,
        port: PortNo,
        neighbor: EntityId,
    ) -> Result<Option<EntityId>> {
        Ok(self.switch_mut(dpid)?.ports.insert(port, neighbor))
    }

    /// Clears `port` of `dpid`, returning the neighbor it pointed at.
    pub fn clear_port(&mut self, dpid: Dpid, port: PortNo) -> Result<Option<EntityId>> {
        Ok(self.switch_mut(dpid)?.ports.remove(&port))
    }

    /// Clears, on every switch, the ports that point at `neighbor`.
    pub fn clear_all_ports_to(&mut self, neighbor: &EntityId) -> usize {
        let mut cleared = 0;
        for switch in self.switches.values_mut() {
            let before = switch.ports.len();
            switch.ports.retain(|_, id| id != neighbor);
            cleared += before - switch.ports.len();
        }
        cleared
    }

    pub fn neighbor_at_port(&self, dpid: Dpid, port: PortNo) -> Option<EntityId> {
        self.switches.get(&dpid)?.neighbor_at(port)
    }

    /// Reverse lookup; see [`Switch::port_to`] for the tie-break caveat.
    pub fn port_to_neighbor(&self, dpid: Dpid, neighbor: &EntityId) -> Option<PortNo> {
        self.switches.get(&dpid)?.port_to(neighbor)
    }

    /// True if `from` is a known switch with at least one port pointing at `to`.
    pub fn has_port_toward(&self, from: &EntityId, to: &EntityId) -> bool {
        from.as_switch()
            .and_then(|dpid| self.switches.get(&dpid))
            .is_some_and(|switch| switch.has_port_to(to))
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        match id {
            EntityId::Switch(dpid) => self.switches.contains_key(dpid),
            EntityId::Host(mac) => self.hosts.contains_key(mac),
        }
    }

    pub fn contains_switch(&self, dpid: Dpid) -> bool {
        self.switches.contains_key(&dpid)
    }

    pub fn contains_host(&self, mac: MacAddr) -> bool {
        self.hosts.contains_key(&mac)
    }

    pub fn switch(&self, dpid: Dpid) -> Option<&Switch> {
        self.switches.get(&dpid)
    }

    pub fn host(&self, mac: MacAddr) -> Option<&Host> {
        self.hosts.get(&mac)
    }

    pub fn switches(&self) -> impl Iterator<Item = &Switch> {
        self.switches.values()
    }

    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    pub fn switch_count(&self) -> usize {
        self.switches.len()
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Hosts whose recorded attachment switch is `dpid`.
    pub fn hosts_attached_to(&self, dpid: Dpid) -> Vec<MacAddr> {
        self.hosts
            .values()
            .filter(|host| host.location.dpid == dpid)
            .map(|host| host.mac)
            .collect()
    }

    fn switch_mut(&mut self, dpid: Dpid) -> Result<&mut Switch> {
        self.switches
            .get_mut(&dpid)
            .ok_or(TopologyError::UnknownEntity(dpid.into()))
    }
}
