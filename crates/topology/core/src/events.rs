//! Inbound topology events and per-event outcomes.

use dyntopo_primitives::{ConnectionHandle, Dpid, EntityId, HostLocation, MacAddr, PortNo};

/// Direction of a link change reported by discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkChange {
    Added,
    Removed,
}

/// A switch-to-switch link as seen by discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkEvent {
    pub dpid1: Dpid,
    pub port1: PortNo,
    pub dpid2: Dpid,
    pub port2: PortNo,
    pub change: LinkChange,
}

impl LinkEvent {
    pub fn added(dpid1: Dpid, port1: PortNo, dpid2: Dpid, port2: PortNo) -> Self {
        Self {
            dpid1,
            port1,
            dpid2,
            port2,
            change: LinkChange::Added,
        }
    }

    pub fn removed(dpid1: Dpid, port1: PortNo, dpid2: Dpid, port2: PortNo) -> Self {
        Self {
            dpid1,
            port1,
            dpid2,
            port2,
            change: LinkChange::Removed,
        }
    }
}

/// A host-tracker report. `leave == false` covers both join and move; the processor tells
/// them apart by whether the MAC is already known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEvent {
    pub mac: MacAddr,
    pub location: HostLocation,
    pub leave: bool,
}

impl HostEvent {
    pub fn join(mac: MacAddr, location: HostLocation) -> Self {
        Self {
            mac,
            location,
            leave: false,
        }
    }

    pub fn leave(mac: MacAddr, location: HostLocation) -> Self {
        Self {
            mac,
            location,
            leave: true,
        }
    }
}

/// Everything the engine reacts to.
#[derive(Debug, Clone)]
pub enum TopologyEvent {
    SwitchConnected {
        dpid: Dpid,
        connection: ConnectionHandle,
    },
    SwitchDisconnected {
        dpid: Dpid,
    },
    Link(LinkEvent),
    Host(HostEvent),
}

impl TopologyEvent {
    pub fn switch_connected(dpid: Dpid) -> Self {
        Self::SwitchConnected {
            dpid,
            connection: ConnectionHandle::new(),
        }
    }

    pub fn switch_disconnected(dpid: Dpid) -> Self {
        Self::SwitchDisconnected { dpid }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SwitchConnected { .. } => "switch_connected",
            Self::SwitchDisconnected { .. } => "switch_disconnected",
            Self::Link(LinkEvent {
                change: LinkChange::Added,
                ..
            }) => "link_added",
            Self::Link(LinkEvent {
                change: LinkChange::Removed,
                ..
            }) => "link_removed",
            Self::Host(HostEvent { leave: true, .. }) => "host_leave",
            Self::Host(HostEvent { leave: false, .. }) => "host_update",
        }
    }

    /// The entity the event is primarily about.
    pub fn subject(&self) -> EntityId {
        match self {
            Self::SwitchConnected { dpid, .. } | Self::SwitchDisconnected { dpid } => {
                EntityId::Switch(*dpid)
            }
            Self::Link(link) => EntityId::Switch(link.dpid1),
            Self::Host(host) => EntityId::Host(host.mac),
        }
    }
}

impl From<LinkEvent> for TopologyEvent {
    fn from(event: LinkEvent) -> Self {
        Self::Link(event)
    }
}

impl From<HostEvent> for TopologyEvent {
    fn from(event: HostEvent) -> Self {
        Self::Host(event)
    }
}

/// What an accepted event did to the topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    SwitchAdded {
        dpid: Dpid,
    },
    /// Re-announcement of a connected switch; nothing changed.
    SwitchAlreadyConnected {
        dpid: Dpid,
    },
    SwitchRemoved {
        dpid: Dpid,
        /// Hosts removed along with the switch under [`OrphanPolicy::Remove`](crate::OrphanPolicy).
        orphans_removed: Vec<MacAddr>,
    },
    LinkAdded {
        dpid1: Dpid,
        dpid2: Dpid,
    },
    LinkRemoved {
        dpid1: Dpid,
        dpid2: Dpid,
        /// False while another port still joins the pair.
        edge_removed: bool,
    },
    HostAttached {
        mac: MacAddr,
        dpid: Dpid,
        port: PortNo,
        /// Previous attachment when this was a move.
        previous: Option<(Dpid, PortNo)>,
    },
    HostRemoved {
        mac: MacAddr,
    },
    /// Disconnect or leave for an entity that is not tracked.
    Ignored {
        subject: EntityId,
    },
}

impl Applied {
    /// True if the event changed registry or graph state.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Self::SwitchAlreadyConnected { .. } | Self::Ignored { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_names_the_tracked_entity() {
        let mac = MacAddr::from_u64(7);
        let location = HostLocation::new(Dpid::new(2), 3);

        assert_eq!(
            TopologyEvent::switch_disconnected(Dpid::new(4)).subject(),
            EntityId::Switch(Dpid::new(4))
        );
        assert_eq!(
            TopologyEvent::from(LinkEvent::removed(Dpid::new(1), 1, Dpid::new(2), 1)).subject(),
            EntityId::Switch(Dpid::new(1))
        );
        let leave = TopologyEvent::from(HostEvent::leave(mac, location));
        assert_eq!(leave.subject(), EntityId::Host(mac));
        assert_eq!(leave.kind(), "host_leave");
    }

    #[test]
    fn test_only_noops_are_not_mutations() {
        let dpid = Dpid::new(1);
        assert!(Applied::SwitchAdded { dpid }.is_mutation());
        assert!(!Applied::SwitchAlreadyConnected { dpid }.is_mutation());
        assert!(
            !Applied::Ignored {
                subject: dpid.into()
            }
            .is_mutation()
        );
    }
}
