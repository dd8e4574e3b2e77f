//! The event state machine.
//!
//! Every handler validates its preconditions before touching anything, so a rejected event
//! leaves registry and graph exactly as they were.

use dyntopo_primitives::{ConnectionHandle, Dpid, EntityId, HostLocation, MacAddr, PortNo};
use tracing::{debug, trace, warn};

use crate::config::OrphanPolicy;
use crate::error::{InvariantViolation, Result, TopologyError};
use crate::events::{Applied, HostEvent, LinkChange, LinkEvent, TopologyEvent};
use crate::graph::AdjacencyGraph;
use crate::registry::EntityRegistry;

/// Registry and graph, owned together.
#[derive(Debug, Default)]
pub struct TopologyState {
    registry: EntityRegistry,
    graph: AdjacencyGraph,
}

impl TopologyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn graph(&self) -> &AdjacencyGraph {
        &self.graph
    }

    /// Verifies graph shape, registry/graph agreement and port backing.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.graph.check()?;

        for switch in self.registry.switches() {
            let id = EntityId::Switch(switch.dpid());
            if !self.graph.contains_node(&id) {
                return Err(InvariantViolation::MissingNode(id));
            }
        }
        for host in self.registry.hosts() {
            let id = EntityId::Host(host.mac());
            if !self.graph.contains_node(&id) {
                return Err(InvariantViolation::MissingNode(id));
            }
        }
        for node in self.graph.nodes() {
            if !self.registry.contains(node) {
                return Err(InvariantViolation::Unregistered(*node));
            }
        }

        for switch in self.registry.switches() {
            let id = EntityId::Switch(switch.dpid());
            for (port, target) in switch.ports() {
                if !self.registry.contains(target) || !self.graph.contains_edge(&id, target) {
                    return Err(InvariantViolation::UnbackedPort {
                        switch: id,
                        port: *port,
                        target: *target,
                    });
                }
            }
        }
        for node in self.graph.nodes() {
            for neighbor in self.graph.neighbors_iter(node) {
                if !self.registry.has_port_toward(node, neighbor)
                    && !self.registry.has_port_toward(neighbor, node)
                {
                    return Err(InvariantViolation::UnbackedEdge {
                        from: *node,
                        to: *neighbor,
                    });
                }
            }
        }
        Ok(())
    }

    /// Drops the `switch -- neighbor` edge if no port on either side still backs it.
    fn prune_unbacked(&mut self, switch: EntityId, neighbor: EntityId) -> bool {
        if self.registry.has_port_toward(&switch, &neighbor)
            || self.registry.has_port_toward(&neighbor, &switch)
        {
            return false;
        }
        self.graph.remove_edge(&switch, &neighbor)
    }

    /// Records that `port` of `dpid` now leads to `target`, pruning whatever it displaced.
    fn point_port(&mut self, dpid: Dpid, port: PortNo, target: EntityId) -> Result<()> {
        let previous = self.registry.set_port(dpid, port, target)?;
        if let Some(displaced) = previous.filter(|prev| *prev != target) {
            trace!(%dpid, port, %displaced, %target, "Port reassigned");
            self.prune_unbacked(EntityId::Switch(dpid), displaced);
        }
        Ok(())
    }
}

/// Applies [`TopologyEvent`]s to a [`TopologyState`].
#[derive(Debug, Default)]
pub struct TopologyProcessor {
    state: TopologyState,
    orphan_policy: OrphanPolicy,
}

impl TopologyProcessor {
    pub fn new(orphan_policy: OrphanPolicy) -> Self {
        Self {
            state: TopologyState::new(),
            orphan_policy,
        }
    }

    pub fn state(&self) -> &TopologyState {
        &self.state
    }

    pub fn orphan_policy(&self) -> OrphanPolicy {
        self.orphan_policy
    }

    /// Applies one event as a single step.
    ///
    /// Precondition failures are logged and returned; the event is dropped and state is
    /// unchanged.
    pub fn process(&mut self, event: TopologyEvent) -> Result<Applied> {
        let kind = event.kind();
        let subject = event.subject();
        let outcome = match event {
            TopologyEvent::SwitchConnected { dpid, connection } => {
                Ok(self.switch_connected(dpid, connection))
            }
            TopologyEvent::SwitchDisconnected { dpid } => Ok(self.switch_disconnected(dpid)),
            TopologyEvent::Link(link) => self.link(link),
            TopologyEvent::Host(host) => self.host(host),
        };

        match &outcome {
            Ok(applied) => debug!(event = kind, %subject, ?applied, "Topology event applied"),
            Err(error) => warn!(event = kind, %subject, %error, "Dropping topology event"),
        }
        debug_assert!(
            self.state.check_invariants().is_ok(),
            "topology invariant broken after {kind}: {:?}",
            self.state.check_invariants()
        );
        outcome
    }

    fn switch_connected(&mut self, dpid: Dpid, connection: ConnectionHandle) -> Applied {
        if let Err(error) = self.state.registry.add_switch(dpid, connection) {
            debug_assert!(matches!(error, TopologyError::DuplicateEntity(_)));
            return Applied::SwitchAlreadyConnected { dpid };
        }
        self.state.graph.ensure_node(dpid.into());
        Applied::SwitchAdded { dpid }
    }

    fn switch_disconnected(&mut self, dpid: Dpid) -> Applied {
        let id = EntityId::Switch(dpid);
        if self.state.registry.remove_switch(dpid).is_err() {
            return Applied::Ignored { subject: id };
        }
        self.state.graph.remove_node(&id);
        self.state.registry.clear_all_ports_to(&id);

        let mut orphans_removed = Vec::new();
        if self.orphan_policy == OrphanPolicy::Remove {
            let mut orphans = self.state.registry.hosts_attached_to(dpid);
            orphans.sort();
            for mac in orphans {
                let host = EntityId::Host(mac);
                if self.state.graph.degree(&host) > 0 {
                    continue;
                }
                if self.state.registry.remove_host(mac).is_ok() {
                    self.state.registry.clear_all_ports_to(&host);
                    self.state.graph.remove_node(&host);
                    orphans_removed.push(mac);
                }
            }
        }

        Applied::SwitchRemoved {
            dpid,
            orphans_removed,
        }
    }

    fn link(&mut self, link: LinkEvent) -> Result<Applied> {
        let LinkEvent {
            dpid1,
            port1,
            dpid2,
            port2,
            change,
        } = link;
        for dpid in [dpid1, dpid2] {
            if !self.state.registry.contains_switch(dpid) {
                return Err(TopologyError::UnknownEntity(dpid.into()));
            }
        }
        let (s1, s2) = (EntityId::Switch(dpid1), EntityId::Switch(dpid2));

        match change {
            LinkChange::Added => {
                self.state.point_port(dpid1, port1, s2)?;
                self.state.point_port(dpid2, port2, s1)?;
                self.state.graph.add_edge(s1, s2);
                Ok(Applied::LinkAdded { dpid1, dpid2 })
            }
            LinkChange::Removed => {
                if self.state.registry.neighbor_at_port(dpid1, port1) == Some(s2) {
                    self.state.registry.clear_port(dpid1, port1)?;
                }
                if self.state.registry.neighbor_at_port(dpid2, port2) == Some(s1) {
                    self.state.registry.clear_port(dpid2, port2)?;
                }
                let edge_removed = self.state.prune_unbacked(s1, s2);
                Ok(Applied::LinkRemoved {
                    dpid1,
                    dpid2,
                    edge_removed,
                })
            }
        }
    }

    fn host(&mut self, event: HostEvent) -> Result<Applied> {
        let HostEvent {
            mac,
            location,
            leave,
        } = event;
        if leave {
            Ok(self.host_left(mac))
        } else {
            self.host_attached(mac, location)
        }
    }

    fn host_left(&mut self, mac: MacAddr) -> Applied {
        let id = EntityId::Host(mac);
        if self.state.registry.remove_host(mac).is_err() {
            return Applied::Ignored { subject: id };
        }
        self.state.registry.clear_all_ports_to(&id);
        self.state.graph.remove_node(&id);
        Applied::HostRemoved { mac }
    }

    fn host_attached(&mut self, mac: MacAddr, location: HostLocation) -> Result<Applied> {
        let (dpid, port) = location.attachment();
        if !self.state.registry.contains_switch(dpid) {
            return Err(TopologyError::UnknownEntity(dpid.into()));
        }
        let id = EntityId::Host(mac);

        let previous = self
            .state
            .registry
            .host(mac)
            .map(|host| host.location().attachment());
        if previous.is_some() {
            let former = self.state.graph.detach(&id);
            self.state.registry.clear_all_ports_to(&id);
            trace!(%mac, ?former, "Host detached");
        }

        self.state.registry.add_host(mac, location);
        self.state.graph.ensure_node(id);
        self.state.point_port(dpid, port, id)?;
        self.state.graph.add_edge(dpid.into(), id);

        Ok(Applied::HostAttached {
            mac,
            dpid,
            port,
            previous,
        })
    }
}
