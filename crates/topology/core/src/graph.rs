//! Undirected adjacency graph over entity ids.
//!
//! Every mutation touches both endpoints, so the graph is symmetric after each call.

use std::collections::{BTreeMap, BTreeSet};

use dyntopo_primitives::EntityId;

use crate::error::InvariantViolation;

/// Map from entity id to its neighbor set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyGraph {
    nodes: BTreeMap<EntityId, BTreeSet<EntityId>>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty neighbor set for `id` if it has none. Returns true if created.
    pub fn ensure_node(&mut self, id: EntityId) -> bool {
        if self.nodes.contains_key(&id) {
            return false;
        }
        self.nodes.insert(id, BTreeSet::new());
        true
    }

    /// Inserts `a -- b`. Returns true if the edge is new.
    pub fn add_edge(&mut self, a: EntityId, b: EntityId) -> bool {
        self.ensure_node(a);
        self.ensure_node(b);
        let inserted = self.nodes.entry(a).or_default().insert(b);
        self.nodes.entry(b).or_default().insert(a);
        inserted
    }

    /// Removes `a -- b` if present. Returns true if an edge was removed.
    pub fn remove_edge(&mut self, a: &EntityId, b: &EntityId) -> bool {
        let removed = self
            .nodes
            .get_mut(a)
            .is_some_and(|neighbors| neighbors.remove(b));
        if let Some(neighbors) = self.nodes.get_mut(b) {
            neighbors.remove(a);
        }
        removed
    }

    /// Removes `id` and every edge touching it. Returns its former neighbors.
    pub fn remove_node(&mut self, id: &EntityId) -> BTreeSet<EntityId> {
        let Some(neighbors) = self.nodes.remove(id) else {
            return BTreeSet::new();
        };
        // Sweep every set, not only the recorded neighbors.
        for set in self.nodes.values_mut() {
            set.remove(id);
        }
        neighbors
    }

    /// Drops every edge of `id` but keeps its (now empty) node. Returns the former neighbors.
    pub fn detach(&mut self, id: &EntityId) -> BTreeSet<EntityId> {
        let Some(neighbors) = self.nodes.get_mut(id).map(std::mem::take) else {
            return BTreeSet::new();
        };
        for neighbor in &neighbors {
            if let Some(set) = self.nodes.get_mut(neighbor) {
                set.remove(id);
            }
        }
        neighbors
    }

    /// Neighbors of `id`; empty for unknown ids.
    pub fn neighbors(&self, id: &EntityId) -> BTreeSet<EntityId> {
        self.nodes.get(id).cloned().unwrap_or_default()
    }

    pub fn neighbors_iter<'a>(&'a self, id: &EntityId) -> impl Iterator<Item = &'a EntityId> {
        self.nodes.get(id).into_iter().flatten()
    }

    pub fn degree(&self, id: &EntityId) -> usize {
        self.nodes.get(id).map_or(0, BTreeSet::len)
    }

    pub fn contains_node(&self, id: &EntityId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn contains_edge(&self, a: &EntityId, b: &EntityId) -> bool {
        self.nodes.get(a).is_some_and(|set| set.contains(b))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &EntityId> {
        self.nodes.keys()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of undirected edges (a self-loop counts once).
    pub fn edge_count(&self) -> usize {
        let mut loops = 0;
        let mut ends = 0;
        for (id, set) in &self.nodes {
            ends += set.len();
            if set.contains(id) {
                loops += 1;
            }
        }
        (ends - loops) / 2 + loops
    }

    /// Owned copy of the whole mapping.
    pub fn to_map(&self) -> BTreeMap<EntityId, BTreeSet<EntityId>> {
        self.nodes.clone()
    }

    /// Checks symmetry, absence of dangling neighbors, and host degree.
    pub fn check(&self) -> Result<(), InvariantViolation> {
        check_adjacency(&self.nodes)
    }
}

/// Structural checks shared by the live graph and materialized snapshots.
pub(crate) fn check_adjacency(
    nodes: &BTreeMap<EntityId, BTreeSet<EntityId>>,
) -> Result<(), InvariantViolation> {
    for (node, neighbors) in nodes {
        if node.is_host() && neighbors.len() > 1 {
            return Err(InvariantViolation::HostDegree {
                host: *node,
                degree: neighbors.len(),
            });
        }
        for neighbor in neighbors {
            let Some(back) = nodes.get(neighbor) else {
                return Err(InvariantViolation::Dangling {
                    node: *node,
                    neighbor: *neighbor,
                });
            };
            if !back.contains(node) {
                return Err(InvariantViolation::Asymmetric {
                    from: *node,
                    to: *neighbor,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dyntopo_primitives::{Dpid, MacAddr};

    fn sw(n: u64) -> EntityId {
        Dpid::new(n).into()
    }

    fn host(n: u64) -> EntityId {
        MacAddr::from_u64(n).into()
    }

    #[test]
    fn test_ensure_node_idempotent() {
        let mut graph = AdjacencyGraph::new();
        assert!(graph.ensure_node(sw(1)));
        graph.add_edge(sw(1), sw(2));
        assert!(!graph.ensure_node(sw(1)));
        assert_eq!(graph.degree(&sw(1)), 1);
    }

    #[test]
    fn test_add_edge_is_symmetric() {
        let mut graph = AdjacencyGraph::new();
        assert!(graph.add_edge(sw(1), sw(2)));
        assert!(!graph.add_edge(sw(2), sw(1)));
        assert!(graph.contains_edge(&sw(1), &sw(2)));
        assert!(graph.contains_edge(&sw(2), &sw(1)));
        assert_eq!(graph.edge_count(), 1);
        graph.check().unwrap();
    }

    #[test]
    fn test_remove_edge_idempotent() {
        let mut graph = AdjacencyGraph::new();
        graph.add_edge(sw(1), sw(2));
        assert!(graph.remove_edge(&sw(2), &sw(1)));
        assert!(!graph.remove_edge(&sw(1), &sw(2)));
        assert!(!graph.remove_edge(&sw(7), &sw(8)));
        assert!(graph.contains_node(&sw(1)));
        assert!(graph.neighbors(&sw(1)).is_empty());
        graph.check().unwrap();
    }

    #[test]
    fn test_remove_node_sweeps_references() {
        let mut graph = AdjacencyGraph::new();
        graph.add_edge(sw(1), sw(2));
        graph.add_edge(sw(1), sw(3));
        graph.add_edge(sw(1), host(1));

        let former = graph.remove_node(&sw(1));
        assert_eq!(former.len(), 3);
        assert!(!graph.contains_node(&sw(1)));
        for id in [sw(2), sw(3), host(1)] {
            assert!(graph.contains_node(&id));
            assert!(graph.neighbors(&id).is_empty());
        }
        assert!(graph.remove_node(&sw(1)).is_empty());
        graph.check().unwrap();
    }

    #[test]
    fn test_detach_keeps_node() {
        let mut graph = AdjacencyGraph::new();
        graph.add_edge(sw(1), host(1));
        let former = graph.detach(&host(1));
        assert_eq!(former, BTreeSet::from([sw(1)]));
        assert!(graph.contains_node(&host(1)));
        assert_eq!(graph.degree(&host(1)), 0);
        assert!(graph.neighbors(&sw(1)).is_empty());
    }

    #[test]
    fn test_neighbors_of_unknown_is_empty() {
        let graph = AdjacencyGraph::new();
        assert!(graph.neighbors(&host(3)).is_empty());
        assert_eq!(graph.neighbors_iter(&host(3)).count(), 0);
        assert_eq!(graph.degree(&host(3)), 0);
    }

    #[test]
    fn test_self_loop_counts_once() {
        let mut graph = AdjacencyGraph::new();
        graph.add_edge(sw(1), sw(1));
        graph.add_edge(sw(1), sw(2));
        assert_eq!(graph.edge_count(), 2);
        graph.check().unwrap();
    }

    #[test]
    fn test_check_reports_violations() {
        let mut nodes = BTreeMap::new();
        nodes.insert(sw(1), BTreeSet::from([sw(2)]));
        assert_eq!(
            check_adjacency(&nodes),
            Err(InvariantViolation::Dangling {
                node: sw(1),
                neighbor: sw(2)
            })
        );

        nodes.insert(sw(2), BTreeSet::new());
        assert_eq!(
            check_adjacency(&nodes),
            Err(InvariantViolation::Asymmetric {
                from: sw(1),
                to: sw(2)
            })
        );

        let mut nodes = BTreeMap::new();
        nodes.insert(host(1), BTreeSet::from([sw(1), sw(2)]));
        nodes.insert(sw(1), BTreeSet::from([host(1)]));
        nodes.insert(sw(2), BTreeSet::from([host(1)]));
        assert_eq!(
            check_adjacency(&nodes),
            Err(InvariantViolation::HostDegree {
                host: host(1),
                degree: 2
            })
        );
    }
}
