//! Feeds a recorded trace through the topology actor.

use dyntopo_topology::{
    Applied, TopologyConfig, TopologyError, TopologySnapshot, create_topology_actor,
};
use eyre::{Result, bail};
use tracing::{debug, info, warn};

use crate::trace::Trace;

/// Replay options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    /// Verify structural invariants on a snapshot after every event.
    pub check: bool,
}

/// Outcome of a replay.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    /// Outcome of every accepted event, in trace order (1-based step, outcome).
    pub applied: Vec<(usize, Applied)>,
    /// Events dropped because their preconditions failed.
    pub dropped: Vec<(usize, TopologyError)>,
    /// Final topology.
    pub snapshot: TopologySnapshot,
}

impl ReplayReport {
    /// Number of accepted events that changed the topology.
    pub fn mutations(&self) -> usize {
        self.applied.iter().filter(|(_, a)| a.is_mutation()).count()
    }
}

/// Replays `trace` on a fresh topology service configured by `config`.
pub async fn replay(
    trace: Trace,
    config: &TopologyConfig,
    options: ReplayOptions,
) -> Result<ReplayReport> {
    let (service, handle) = create_topology_actor(config);
    let task = tokio::spawn(service.into_task());

    let mut applied = Vec::new();
    let mut dropped = Vec::new();
    for (index, event) in trace.events.into_iter().enumerate() {
        let step = index + 1;
        let description = event.to_string();
        match handle.apply(event).await {
            Ok(outcome) => {
                debug!(step, event = %description, ?outcome, "Replayed event");
                applied.push((step, outcome));
            }
            Err(error) if error.is_precondition() => {
                warn!(step, event = %description, %error, "Event dropped");
                dropped.push((step, error));
            }
            Err(error) => return Err(error.into()),
        }

        if options.check {
            let snapshot = handle.snapshot().await?;
            if let Err(violation) = snapshot.verify() {
                bail!("invariant violated after step {step} ({description}): {violation}");
            }
        }
    }

    let snapshot = handle.snapshot().await?;
    drop(handle);
    task.await?;

    info!(
        events = applied.len() + dropped.len(),
        dropped = dropped.len(),
        switches = snapshot.switches.len(),
        hosts = snapshot.hosts.len(),
        edges = snapshot.edge_count(),
        "Replay finished"
    );
    Ok(ReplayReport {
        applied,
        dropped,
        snapshot,
    })
}
