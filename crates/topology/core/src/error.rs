//! Error types for the topology engine.

use dyntopo_primitives::{EntityId, PortNo};

/// Failure of a registry operation, an event precondition, or the actor channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    /// Creation of an entity that is already tracked.
    #[error("entity {0} already exists")]
    DuplicateEntity(EntityId),
    /// Reference to a switch or host that is not currently tracked.
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
    /// The topology service task has stopped.
    #[error("topology service stopped")]
    ServiceStopped,
}

impl TopologyError {
    /// True for errors caused by upstream event ordering rather than the engine itself.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::UnknownEntity(_) | Self::DuplicateEntity(_))
    }
}

pub type Result<T, E = TopologyError> = core::result::Result<T, E>;

/// A broken structural invariant. Always a bug in the engine, never an input problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("edge {from} -> {to} has no reverse edge")]
    Asymmetric { from: EntityId, to: EntityId },
    #[error("{node} lists {neighbor} which has no graph entry")]
    Dangling { node: EntityId, neighbor: EntityId },
    #[error("host {host} has {degree} neighbors")]
    HostDegree { host: EntityId, degree: usize },
    #[error("{0} is registered but has no graph node")]
    MissingNode(EntityId),
    #[error("graph node {0} is not registered")]
    Unregistered(EntityId),
    #[error("port {port} of {switch} points at {target} without a matching edge")]
    UnbackedPort {
        switch: EntityId,
        port: PortNo,
        target: EntityId,
    },
    #[error("edge {from} -- {to} is not backed by any port mapping")]
    UnbackedEdge { from: EntityId, to: EntityId },
}
