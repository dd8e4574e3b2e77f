//! Live switch/host topology for an SDN control plane.
//!
//! Control events arrive from independent discovery subsystems (switch connections, link
//! discovery, host tracking) in any order. The engine folds them into an entity registry
//! and an undirected adjacency graph that downstream logic queries for "who is adjacent to
//! whom".
//!
//! # Guarantees
//!
//! After every event:
//! - adjacency is symmetric and every neighbor is itself a node,
//! - a host has at most one neighbor,
//! - every port entry has a matching edge and every edge is backed by a port entry.
//!
//! An event whose preconditions fail (for example a link naming an unknown switch) is
//! reported, dropped, and leaves the state untouched.
//!
//! # Actor Pattern
//!
//! - [`TopologyService`] owns the state and runs in its own tokio task
//! - [`TopologyHandle`] is cheap to clone and used to submit events and run queries
//! - [`TopologyReader`] exposes the latest published [`TopologySnapshot`] without going
//!   through the queue
//!
//! Use [`create_topology_actor`] to create the service and handle pair.
//!
//! [`TopologyProcessor`] is the synchronous core and can be driven directly.

pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod handle;
pub mod processor;
pub mod reader;
pub mod registry;
pub mod service;
pub mod view;

use tokio::sync::mpsc;

pub use config::{OrphanPolicy, TopologyConfig};
pub use error::{InvariantViolation, Result, TopologyError};
pub use events::{Applied, HostEvent, LinkChange, LinkEvent, TopologyEvent};
pub use graph::AdjacencyGraph;
pub use handle::TopologyHandle;
pub use processor::{TopologyProcessor, TopologyState};
pub use reader::TopologyReader;
pub use registry::{EntityRegistry, Host, Switch};
pub use service::{TopologyCommand, TopologyService};
pub use view::{TopologySnapshot, TopologyView};

pub use dyntopo_primitives as primitives;

/// Creates the topology service and its handle.
///
/// The service must be spawned (for example with `tokio::spawn(service.into_task())`) before
/// requests on the handle complete.
pub fn create_topology_actor(config: &TopologyConfig) -> (TopologyService, TopologyHandle) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let service = TopologyService::new(command_rx, config);
    let handle = TopologyHandle::new(command_tx);
    (service, handle)
}
