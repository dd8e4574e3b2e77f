//! Read-only introspection over the topology.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use dyntopo_primitives::{Dpid, EntityId, HostLocation, MacAddr, PortNo};
use serde::{Deserialize, Serialize};

use crate::error::InvariantViolation;
use crate::graph::check_adjacency;
use crate::processor::TopologyState;

/// Queries downstream consumers run against the topology.
pub trait TopologyView {
    /// Connected switches, ascending.
    fn list_switches(&self) -> Vec<Dpid>;

    /// Known hosts, ascending.
    fn list_hosts(&self) -> Vec<MacAddr>;

    /// Neighbors of `id`. Unknown ids have none.
    fn neighbors(&self, id: &EntityId) -> BTreeSet<EntityId>;

    /// Port of `switch` leading to `neighbor`. With several candidates the choice is
    /// unspecified but stable for a given state.
    fn port_of(&self, switch: Dpid, neighbor: &EntityId) -> Option<PortNo>;

    /// Latest location record of a host.
    fn host_location(&self, mac: MacAddr) -> Option<HostLocation>;

    /// Fully materialized copy of the current state.
    fn snapshot(&self) -> TopologySnapshot;
}

/// A consistent, owned copy of registry and graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    /// Port map of every connected switch.
    pub switches: BTreeMap<Dpid, BTreeMap<PortNo, EntityId>>,
    /// Location record of every known host.
    pub hosts: BTreeMap<MacAddr, HostLocation>,
    /// Undirected adjacency, both directions listed.
    pub adjacency: BTreeMap<EntityId, BTreeSet<EntityId>>,
}

impl TopologySnapshot {
    pub fn is_empty(&self) -> bool {
        self.switches.is_empty() && self.hosts.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        let mut ends = 0;
        let mut loops = 0;
        for (id, set) in &self.adjacency {
            ends += set.len();
            if set.contains(id) {
                loops += 1;
            }
        }
        (ends - loops) / 2 + loops
    }

    /// Checks the same structural rules the live state upholds.
    pub fn verify(&self) -> Result<(), InvariantViolation> {
        check_adjacency(&self.adjacency)?;

        let registered = self
            .switches
            .keys()
            .map(|dpid| EntityId::Switch(*dpid))
            .chain(self.hosts.keys().map(|mac| EntityId::Host(*mac)));
        for id in registered {
            if !self.adjacency.contains_key(&id) {
                return Err(InvariantViolation::MissingNode(id));
            }
        }
        for id in self.adjacency.keys() {
            if !self.contains(id) {
                return Err(InvariantViolation::Unregistered(*id));
            }
        }

        for (dpid, ports) in &self.switches {
            let switch = EntityId::Switch(*dpid);
            for (port, target) in ports {
                let linked = self
                    .adjacency
                    .get(&switch)
                    .is_some_and(|set| set.contains(target));
                if !linked {
                    return Err(InvariantViolation::UnbackedPort {
                        switch,
                        port: *port,
                        target: *target,
                    });
                }
            }
        }
        for (node, neighbors) in &self.adjacency {
            for neighbor in neighbors {
                if !self.has_port_toward(node, neighbor) && !self.has_port_toward(neighbor, node) {
                    return Err(InvariantViolation::UnbackedEdge {
                        from: *node,
                        to: *neighbor,
                    });
                }
            }
        }
        Ok(())
    }

    fn contains(&self, id: &EntityId) -> bool {
        match id {
            EntityId::Switch(dpid) => self.switches.contains_key(dpid),
            EntityId::Host(mac) => self.hosts.contains_key(mac),
        }
    }

    fn has_port_toward(&self, from: &EntityId, to: &EntityId) -> bool {
        from.as_switch()
            .and_then(|dpid| self.switches.get(&dpid))
            .is_some_and(|ports| ports.values().any(|id| id == to))
    }
}

impl TopologyView for TopologySnapshot {
    fn list_switches(&self) -> Vec<Dpid> {
        self.switches.keys().copied().collect()
    }

    fn list_hosts(&self) -> Vec<MacAddr> {
        self.hosts.keys().copied().collect()
    }

    fn neighbors(&self, id: &EntityId) -> BTreeSet<EntityId> {
        self.adjacency.get(id).cloned().unwrap_or_default()
    }

    fn port_of(&self, switch: Dpid, neighbor: &EntityId) -> Option<PortNo> {
        self.switches
            .get(&switch)?
            .iter()
            .find_map(|(port, id)| (id == neighbor).then_some(*port))
    }

    fn host_location(&self, mac: MacAddr) -> Option<HostLocation> {
        self.hosts.get(&mac).cloned()
    }

    fn snapshot(&self) -> TopologySnapshot {
        self.clone()
    }
}

impl TopologyView for TopologyState {
    fn list_switches(&self) -> Vec<Dpid> {
        let mut switches: Vec<Dpid> = self.registry().switches().map(|s| s.dpid()).collect();
        switches.sort();
        switches
    }

    fn list_hosts(&self) -> Vec<MacAddr> {
        let mut hosts: Vec<MacAddr> = self.registry().hosts().map(|h| h.mac()).collect();
        hosts.sort();
        hosts
    }

    fn neighbors(&self, id: &EntityId) -> BTreeSet<EntityId> {
        self.graph().neighbors(id)
    }

    fn port_of(&self, switch: Dpid, neighbor: &EntityId) -> Option<PortNo> {
        self.registry().port_to_neighbor(switch, neighbor)
    }

    fn host_location(&self, mac: MacAddr) -> Option<HostLocation> {
        self.registry().host(mac).map(|host| host.location().clone())
    }

    fn snapshot(&self) -> TopologySnapshot {
        TopologySnapshot {
            switches: self
                .registry()
                .switches()
                .map(|switch| (switch.dpid(), switch.ports().clone()))
                .collect(),
            hosts: self
                .registry()
                .hosts()
                .map(|host| (host.mac(), host.location().clone()))
                .collect(),
            adjacency: self.graph().to_map(),
        }
    }
}

impl fmt::Display for TopologySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Switches ({}):", self.switches.len())?;
        for (dpid, ports) in &self.switches {
            write!(f, "  {dpid}")?;
            for (port, target) in ports {
                write!(f, " {port}->{target}")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Hosts ({}):", self.hosts.len())?;
        for (mac, location) in &self.hosts {
            write!(f, "  {mac} at {}.{}", location.dpid, location.port)?;
            if !location.ip_addrs.is_empty() {
                let ips: Vec<String> = location.ip_addrs.iter().map(ToString::to_string).collect();
                write!(f, " [{}]", ips.join(", "))?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Adjacency ({} edges):", self.edge_count())?;
        for (node, neighbors) in &self.adjacency {
            let names: Vec<String> = neighbors.iter().map(ToString::to_string).collect();
            writeln!(f, "  {node}: {{{}}}", names.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{HostEvent, LinkEvent, TopologyEvent};
    use crate::processor::TopologyProcessor;

    fn dpid(n: u64) -> Dpid {
        Dpid::new(n)
    }

    fn mac(n: u64) -> MacAddr {
        MacAddr::from_u64(n)
    }

    fn sample() -> TopologyProcessor {
        let mut processor = TopologyProcessor::default();
        for n in [2, 1] {
            processor
                .process(TopologyEvent::switch_connected(dpid(n)))
                .unwrap();
        }
        processor
            .process(LinkEvent::added(dpid(1), 1, dpid(2), 1).into())
            .unwrap();
        let location = HostLocation::new(dpid(1), 3).with_ip("10.0.0.1".parse().unwrap());
        processor
            .process(HostEvent::join(mac(1), location).into())
            .unwrap();
        processor
    }

    #[test]
    fn test_state_and_snapshot_agree() {
        let processor = sample();
        let state = processor.state();
        let snapshot = state.snapshot();

        assert_eq!(state.list_switches(), vec![dpid(1), dpid(2)]);
        assert_eq!(snapshot.list_switches(), state.list_switches());
        assert_eq!(snapshot.list_hosts(), vec![mac(1)]);
        for id in snapshot.adjacency.keys() {
            assert_eq!(snapshot.neighbors(id), state.neighbors(id));
        }
        let h1 = EntityId::Host(mac(1));
        assert_eq!(state.port_of(dpid(1), &h1), Some(3));
        assert_eq!(snapshot.port_of(dpid(1), &h1), Some(3));
        assert_eq!(snapshot.host_location(mac(1)), state.host_location(mac(1)));
        assert_eq!(snapshot.edge_count(), 2);
        snapshot.verify().unwrap();
    }

    #[test]
    fn test_snapshot_is_detached_from_state() {
        let mut processor = sample();
        let before = processor.state().snapshot();
        processor
            .process(TopologyEvent::switch_disconnected(dpid(2)))
            .unwrap();
        assert!(before.switches.contains_key(&dpid(2)));
        assert!(!processor.state().snapshot().switches.contains_key(&dpid(2)));
    }

    #[test]
    fn test_verify_rejects_unbacked_port() {
        let mut snapshot = sample().state().snapshot();
        snapshot
            .switches
            .get_mut(&dpid(2))
            .unwrap()
            .insert(7, EntityId::Host(mac(1)));
        assert_eq!(
            snapshot.verify(),
            Err(InvariantViolation::UnbackedPort {
                switch: EntityId::Switch(dpid(2)),
                port: 7,
                target: EntityId::Host(mac(1)),
            })
        );
    }

    #[test]
    fn test_snapshot_serde() {
        let snapshot = sample().state().snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("00-00-00-00-00-01"));
        let decoded: TopologySnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_display_lists_everything() {
        let text = sample().state().snapshot().to_string();
        assert!(text.contains("Switches (2):"));
        assert!(text.contains("00:00:00:00:00:01 at 00-00-00-00-00-01.3 [10.0.0.1]"));
        assert!(text.contains("Adjacency (2 edges):"));
    }

    #[test]
    fn test_unknown_queries_are_empty() {
        let processor = TopologyProcessor::default();
        let state = processor.state();
        assert!(state.neighbors(&EntityId::Switch(dpid(9))).is_empty());
        assert_eq!(state.port_of(dpid(9), &EntityId::Host(mac(1))), None);
        assert!(state.snapshot().is_empty());
    }
}
