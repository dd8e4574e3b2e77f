//! Cloneable handle for interacting with the topology service.

use std::collections::BTreeSet;

use dyntopo_primitives::{Dpid, EntityId, HostLocation, MacAddr, PortNo};
use tokio::sync::{mpsc, oneshot};

use crate::error::{Result, TopologyError};
use crate::events::{Applied, TopologyEvent};
use crate::service::TopologyCommand;
use crate::view::TopologySnapshot;

/// Cloneable handle for submitting events and querying the topology.
#[derive(Clone)]
pub struct TopologyHandle {
    command_tx: mpsc::UnboundedSender<TopologyCommand>,
}

impl TopologyHandle {
    /// Create a new handle from a command sender.
    pub fn new(command_tx: mpsc::UnboundedSender<TopologyCommand>) -> Self {
        Self { command_tx }
    }

    /// Queues an event without waiting for it. Rejections are only logged by the service.
    pub fn submit(&self, event: impl Into<TopologyEvent>) -> Result<()> {
        self.send(TopologyCommand::Event {
            event: event.into(),
            response_tx: None,
        })
    }

    /// Applies an event and waits for its outcome.
    pub async fn apply(&self, event: impl Into<TopologyEvent>) -> Result<Applied> {
        let (tx, rx) = oneshot::channel();
        self.send(TopologyCommand::Event {
            event: event.into(),
            response_tx: Some(tx),
        })?;
        rx.await.map_err(|_| TopologyError::ServiceStopped)?
    }

    pub async fn neighbors(&self, id: impl Into<EntityId>) -> Result<BTreeSet<EntityId>> {
        let id = id.into();
        self.request(|response_tx| TopologyCommand::Neighbors { id, response_tx })
            .await
    }

    /// Port of `dpid` leading to `neighbor`. See [`TopologyView::port_of`](crate::TopologyView::port_of).
    pub async fn port_of(&self, dpid: Dpid, neighbor: impl Into<EntityId>) -> Result<Option<PortNo>> {
        let neighbor = neighbor.into();
        self.request(|response_tx| TopologyCommand::PortOf {
            dpid,
            neighbor,
            response_tx,
        })
        .await
    }

    pub async fn host_location(&self, mac: MacAddr) -> Result<Option<HostLocation>> {
        self.request(|response_tx| TopologyCommand::HostLocation { mac, response_tx })
            .await
    }

    pub async fn list_switches(&self) -> Result<Vec<Dpid>> {
        self.request(|response_tx| TopologyCommand::ListSwitches { response_tx })
            .await
    }

    pub async fn list_hosts(&self) -> Result<Vec<MacAddr>> {
        self.request(|response_tx| TopologyCommand::ListHosts { response_tx })
            .await
    }

    /// Snapshot taken between events on the service task.
    pub async fn snapshot(&self) -> Result<TopologySnapshot> {
        self.request(|response_tx| TopologyCommand::Snapshot { response_tx })
            .await
    }

    /// True once the service has stopped.
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    fn send(&self, cmd: TopologyCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|_| TopologyError::ServiceStopped)
    }

    async fn request<T>(
        &self,
        cmd: impl FnOnce(oneshot::Sender<T>) -> TopologyCommand,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.send(cmd(tx))?;
        rx.await.map_err(|_| TopologyError::ServiceStopped)
    }
}
