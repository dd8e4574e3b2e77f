//! Topology service actor (runs in its own tokio task).

use std::collections::BTreeSet;
use std::time::Duration;

use dyntopo_primitives::{Dpid, EntityId, HostLocation, MacAddr, PortNo};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::TopologyConfig;
use crate::error::TopologyError;
use crate::events::{Applied, TopologyEvent};
use crate::processor::TopologyProcessor;
use crate::reader::TopologyReader;
use crate::view::{TopologySnapshot, TopologyView};

/// Commands from handles to the service.
pub enum TopologyCommand {
    /// Apply an event. The outcome is reported if a channel is attached.
    Event {
        event: TopologyEvent,
        response_tx: Option<oneshot::Sender<Result<Applied, TopologyError>>>,
    },
    Neighbors {
        id: EntityId,
        response_tx: oneshot::Sender<BTreeSet<EntityId>>,
    },
    PortOf {
        dpid: Dpid,
        neighbor: EntityId,
        response_tx: oneshot::Sender<Option<PortNo>>,
    },
    HostLocation {
        mac: MacAddr,
        response_tx: oneshot::Sender<Option<HostLocation>>,
    },
    ListSwitches {
        response_tx: oneshot::Sender<Vec<Dpid>>,
    },
    ListHosts {
        response_tx: oneshot::Sender<Vec<MacAddr>>,
    },
    Snapshot {
        response_tx: oneshot::Sender<TopologySnapshot>,
    },
}

/// Owns the topology state and serializes every event and query against it.
pub struct TopologyService {
    /// Receive commands from handles.
    command_rx: mpsc::UnboundedReceiver<TopologyCommand>,
    processor: TopologyProcessor,
    /// Published copy for readers that bypass the command queue.
    reader: TopologyReader,
    publish_snapshots: bool,
    /// Periodic state dump, if enabled.
    dump_interval: Option<Interval>,
}

impl TopologyService {
    pub fn new(command_rx: mpsc::UnboundedReceiver<TopologyCommand>, config: &TopologyConfig) -> Self {
        Self {
            command_rx,
            processor: TopologyProcessor::new(config.orphan_hosts),
            reader: TopologyReader::default(),
            publish_snapshots: config.publish_snapshots,
            dump_interval: config.debug_interval().map(dump_timer),
        }
    }

    /// Reader over the snapshots this service publishes.
    pub fn reader(&self) -> TopologyReader {
        self.reader.clone()
    }

    /// Run the service event loop.
    ///
    /// This method runs until all handles are dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    let Some(cmd) = cmd else {
                        debug!("Topology service shutting down");
                        break;
                    };
                    self.handle_command(cmd);
                }
                _ = next_tick(&mut self.dump_interval) => {
                    self.dump();
                }
            }
        }
    }

    /// Convert self into a spawnable future.
    pub async fn into_task(self) {
        self.run().await;
    }

    fn handle_command(&mut self, cmd: TopologyCommand) {
        let state = self.processor.state();
        match cmd {
            TopologyCommand::Event { event, response_tx } => {
                let outcome = self.processor.process(event);
                if self.publish_snapshots && matches!(&outcome, Ok(applied) if applied.is_mutation())
                {
                    self.reader.publish(self.processor.state().snapshot());
                }
                if let Some(tx) = response_tx {
                    let _ = tx.send(outcome);
                }
            }
            TopologyCommand::Neighbors { id, response_tx } => {
                let _ = response_tx.send(state.neighbors(&id));
            }
            TopologyCommand::PortOf {
                dpid,
                neighbor,
                response_tx,
            } => {
                let _ = response_tx.send(state.port_of(dpid, &neighbor));
            }
            TopologyCommand::HostLocation { mac, response_tx } => {
                let _ = response_tx.send(state.host_location(mac));
            }
            TopologyCommand::ListSwitches { response_tx } => {
                let _ = response_tx.send(state.list_switches());
            }
            TopologyCommand::ListHosts { response_tx } => {
                let _ = response_tx.send(state.list_hosts());
            }
            TopologyCommand::Snapshot { response_tx } => {
                let _ = response_tx.send(state.snapshot());
            }
        }
    }

    /// Logs switches with their ports, hosts with their addresses, and the adjacency map.
    fn dump(&self) {
        let snapshot = self.processor.state().snapshot();
        info!(
            switches = snapshot.switches.len(),
            hosts = snapshot.hosts.len(),
            edges = snapshot.edge_count(),
            "Topology state"
        );
        for (dpid, ports) in &snapshot.switches {
            let ports = join(ports.iter().map(|(port, target)| format!("{port}->{target}")));
            info!(%dpid, %ports, "Switch");
        }
        for (mac, location) in &snapshot.hosts {
            let ips = join(location.ip_addrs.iter().map(ToString::to_string));
            info!(%mac, dpid = %location.dpid, port = location.port, %ips, "Host");
        }
        for (node, neighbors) in &snapshot.adjacency {
            let neighbors = join(neighbors.iter().map(ToString::to_string));
            info!(%node, %neighbors, "Adjacency");
        }
    }
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

fn dump_timer(period: Duration) -> Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Completes on the next dump tick; never completes when dumping is off.
async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_topology_actor;
    use crate::events::{HostEvent, LinkEvent};
    use assert_matches::assert_matches;

    fn dpid(n: u64) -> Dpid {
        Dpid::new(n)
    }

    #[tokio::test]
    async fn test_apply_and_query() {
        let (service, handle) = create_topology_actor(&TopologyConfig::default());
        tokio::spawn(service.into_task());

        for n in 1..=2 {
            handle
                .apply(TopologyEvent::switch_connected(dpid(n)))
                .await
                .unwrap();
        }
        let applied = handle
            .apply(LinkEvent::added(dpid(1), 2, dpid(2), 2))
            .await
            .unwrap();
        assert_eq!(
            applied,
            Applied::LinkAdded {
                dpid1: dpid(1),
                dpid2: dpid(2)
            }
        );

        assert_eq!(
            handle.neighbors(dpid(1)).await.unwrap(),
            BTreeSet::from([EntityId::Switch(dpid(2))])
        );
        assert_eq!(handle.port_of(dpid(2), dpid(1)).await.unwrap(), Some(2));
        assert_eq!(handle.list_switches().await.unwrap(), vec![dpid(1), dpid(2)]);
        assert!(handle.list_hosts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_event_is_reported() {
        let (service, handle) = create_topology_actor(&TopologyConfig::default());
        tokio::spawn(service.into_task());

        let mac = MacAddr::from_u64(1);
        let outcome = handle
            .apply(HostEvent::join(mac, HostLocation::new(dpid(3), 1)))
            .await;
        assert_matches!(outcome, Err(TopologyError::UnknownEntity(_)));

        // The service keeps going after a dropped event.
        handle
            .apply(TopologyEvent::switch_connected(dpid(3)))
            .await
            .unwrap();
        handle
            .apply(HostEvent::join(mac, HostLocation::new(dpid(3), 1)))
            .await
            .unwrap();
        assert_eq!(handle.host_location(mac).await.unwrap().unwrap().port, 1);
    }

    #[tokio::test]
    async fn test_submit_is_ordered_before_queries() {
        let (service, handle) = create_topology_actor(&TopologyConfig::default());
        tokio::spawn(service.into_task());

        handle.submit(TopologyEvent::switch_connected(dpid(1))).unwrap();
        handle.submit(TopologyEvent::switch_connected(dpid(2))).unwrap();
        handle
            .submit(LinkEvent::added(dpid(1), 1, dpid(2), 1))
            .unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.edge_count(), 1);
        snapshot.verify().unwrap();
    }

    #[tokio::test]
    async fn test_reader_follows_mutations() {
        let (service, handle) = create_topology_actor(&TopologyConfig::default());
        let reader = service.reader();
        tokio::spawn(service.into_task());

        handle
            .apply(TopologyEvent::switch_connected(dpid(5)))
            .await
            .unwrap();
        assert_eq!(reader.list_switches(), vec![dpid(5)]);

        handle
            .apply(TopologyEvent::switch_disconnected(dpid(5)))
            .await
            .unwrap();
        assert!(reader.current().is_empty());
    }

    #[tokio::test]
    async fn test_reader_unpublished_when_disabled() {
        let config = TopologyConfig::default().with_publish_snapshots(false);
        let (service, handle) = create_topology_actor(&config);
        let reader = service.reader();
        tokio::spawn(service.into_task());

        handle
            .apply(TopologyEvent::switch_connected(dpid(5)))
            .await
            .unwrap();
        assert!(reader.current().is_empty());
    }

    #[tokio::test]
    async fn test_stopped_service() {
        let (service, handle) = create_topology_actor(&TopologyConfig::default());
        drop(service);

        assert!(handle.is_closed());
        assert_matches!(
            handle.submit(TopologyEvent::switch_connected(dpid(1))),
            Err(TopologyError::ServiceStopped)
        );
        assert_matches!(
            handle.snapshot().await,
            Err(TopologyError::ServiceStopped)
        );
    }

    #[tokio::test]
    async fn test_shuts_down_when_handles_dropped() {
        let (service, handle) = create_topology_actor(&TopologyConfig::default());
        let task = tokio::spawn(service.into_task());
        drop(handle);
        task.await.unwrap();
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        /// First record containing every one of `needles`.
        fn line(&self, needles: &[&str]) -> String {
            let output = String::from_utf8_lossy(&self.0.lock()).into_owned();
            output
                .lines()
                .find(|line| needles.iter().all(|needle| line.contains(needle)))
                .unwrap_or_else(|| panic!("no record with {needles:?} in:\n{output}"))
                .to_owned()
        }
    }

    #[test]
    fn test_debug_dump_lists_ports_hosts_and_adjacency() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let mut service = TopologyService::new(rx, &TopologyConfig::default());
        let mac = MacAddr::from_u64(10);
        let ip = "10.0.0.10".parse().unwrap();
        for event in [
            TopologyEvent::switch_connected(dpid(1)),
            TopologyEvent::switch_connected(dpid(2)),
            LinkEvent::added(dpid(1), 1, dpid(2), 2).into(),
            HostEvent::join(mac, HostLocation::new(dpid(1), 3).with_ip(ip)).into(),
        ] {
            service.processor.process(event).unwrap();
        }

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::with_default(subscriber, || service.dump());

        let summary = logs.line(&["Topology state"]);
        assert!(summary.contains("switches=2"));
        assert!(summary.contains("hosts=1"));
        assert!(summary.contains("edges=2"));

        let switch = logs.line(&["Switch", &format!("dpid={}", dpid(1))]);
        assert!(switch.contains(&format!("1->{}", dpid(2))));
        assert!(switch.contains(&format!("3->{mac}")));

        let host = logs.line(&["Host", &format!("mac={mac}")]);
        assert!(host.contains(&format!("dpid={}", dpid(1))));
        assert!(host.contains("port=3"));
        assert!(host.contains("ips=10.0.0.10"));

        let adjacency = logs.line(&["Adjacency", &format!("node={}", dpid(1))]);
        assert!(adjacency.contains(&format!("neighbors={}, {mac}", dpid(2))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debug_dump_does_not_block_shutdown() {
        let config = TopologyConfig::default().with_debug_interval(Duration::from_secs(10));
        let (service, handle) = create_topology_actor(&config);
        let task = tokio::spawn(service.into_task());

        handle
            .apply(TopologyEvent::switch_connected(dpid(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(handle.list_switches().await.unwrap(), vec![dpid(1)]);

        drop(handle);
        task.await.unwrap();
    }
}
