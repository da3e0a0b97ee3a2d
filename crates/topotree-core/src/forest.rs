//! Forest construction from canonical edges.
//!
//! # Overview
//!
//! Roots are the devices with no incoming canonical edge. Each root's tree
//! is grown level by level: the frontier starts as `{root}`, every edge whose
//! host is on the frontier places its attached device as a child, and the
//! newly placed children become the next frontier. A device's parent is the
//! host that first reached it.
//!
//! ## Termination
//!
//! A single visited set is shared across all roots and no device is placed
//! twice, so each frontier holds only never-seen devices and the loop runs
//! at most once per device. An edge that would re-place a device is either a
//! cycle or a second parent; [`ConflictPolicy`] decides whether that aborts
//! the run or is skipped.
//!
//! Devices left unplaced after every root has been expanded sit on (or
//! below) a cycle, since any chain of parent edges that never reaches a root
//! must loop.
//!
//! ## Edge index
//!
//! Canonical edges are loaded into a petgraph [`DiGraph`] keyed by device
//! id, so each expansion step reads a host's outgoing edges directly instead
//! of scanning the edge list.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::dedup::CanonicalEdge;
use crate::error::{RecordRef, TopologyError};
use crate::record::{Device, DeviceId};

/// What to do when the edges do not form a forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Abort with [`TopologyError::CycleDetected`] or
    /// [`TopologyError::MultipleParents`].
    #[default]
    Reject,
    /// Keep the first parent, skip later ones, and report devices that no
    /// root reaches as detached.
    Detach,
}

// ---------------------------------------------------------------------------
// EdgeIndex
// ---------------------------------------------------------------------------

/// Canonical edges indexed by device.
#[derive(Debug)]
pub struct EdgeIndex {
    graph: DiGraph<DeviceId, ()>,
    node_map: HashMap<DeviceId, NodeIndex>,
}

impl EdgeIndex {
    /// Index `edges` over `devices`.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::MalformedRecord`] if an edge names a device
    /// that is not in `devices`.
    pub fn new(devices: &[Device], edges: &[CanonicalEdge]) -> Result<Self, TopologyError> {
        let mut graph = DiGraph::<DeviceId, ()>::with_capacity(devices.len(), edges.len());
        let mut node_map = HashMap::with_capacity(devices.len());

        for device in devices {
            node_map
                .entry(device.id)
                .or_insert_with(|| graph.add_node(device.id));
        }

        for (index, edge) in edges.iter().enumerate() {
            let (Some(&host), Some(&attached)) =
                (node_map.get(&edge.host), node_map.get(&edge.attached))
            else {
                return Err(TopologyError::malformed(
                    RecordRef::Link {
                        index,
                        host: Some(edge.host),
                        attached: Some(edge.attached),
                    },
                    "edge references a device outside the active set",
                ));
            };
            if !graph.contains_edge(host, attached) {
                graph.add_edge(host, attached, ());
            }
        }

        Ok(Self { graph, node_map })
    }

    /// Devices attached to `host`, ascending.
    #[must_use]
    pub fn attached_to(&self, host: DeviceId) -> Vec<DeviceId> {
        self.neighbors(host, Direction::Outgoing)
    }

    /// Hosts of `attached`, ascending.
    #[must_use]
    pub fn hosts_of(&self, attached: DeviceId) -> Vec<DeviceId> {
        self.neighbors(attached, Direction::Incoming)
    }

    #[must_use]
    pub fn has_parent(&self, id: DeviceId) -> bool {
        self.node_map.get(&id).is_some_and(|&idx| {
            self.graph
                .neighbors_directed(idx, Direction::Incoming)
                .next()
                .is_some()
        })
    }

    fn neighbors(&self, id: DeviceId, dir: Direction) -> Vec<DeviceId> {
        let Some(&idx) = self.node_map.get(&id) else {
            return Vec::new();
        };
        let mut ids: Vec<DeviceId> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n])
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Strongly connected components that form a loop (including self-loops),
    /// each sorted, smallest first.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<DeviceId>> {
        let mut cycles: Vec<Vec<DeviceId>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&n| self.graph.find_edge(n, n).is_some())
            })
            .map(|component| {
                let mut ids: Vec<DeviceId> = component.into_iter().map(|n| self.graph[n]).collect();
                ids.sort_unstable();
                ids
            })
            .collect();
        cycles.sort_unstable();
        cycles
    }
}

// ---------------------------------------------------------------------------
// Forest
// ---------------------------------------------------------------------------

/// An arena of trees: parent pointers plus a children index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest {
    roots: Vec<DeviceId>,
    parent: HashMap<DeviceId, DeviceId>,
    children: HashMap<DeviceId, Vec<DeviceId>>,
    tree_of: HashMap<DeviceId, DeviceId>,
    detached: Vec<DeviceId>,
}

impl Forest {
    /// Root devices, ascending.
    #[must_use]
    pub fn roots(&self) -> &[DeviceId] {
        &self.roots
    }

    #[must_use]
    pub fn parent(&self, id: DeviceId) -> Option<DeviceId> {
        self.parent.get(&id).copied()
    }

    /// Children of `id` in the order they were placed.
    #[must_use]
    pub fn children(&self, id: DeviceId) -> &[DeviceId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// The root of the tree containing `id`.
    #[must_use]
    pub fn root_of(&self, id: DeviceId) -> Option<DeviceId> {
        self.tree_of.get(&id).copied()
    }

    /// Devices no root reaches (only populated under [`ConflictPolicy::Detach`]).
    #[must_use]
    pub fn detached(&self) -> &[DeviceId] {
        &self.detached
    }

    /// Number of devices placed in some tree.
    #[must_use]
    pub fn placed_count(&self) -> usize {
        self.tree_of.len()
    }

    fn place(&mut self, device: DeviceId, host: DeviceId, root: DeviceId) {
        self.parent.insert(device, host);
        self.children.entry(host).or_default().push(device);
        self.tree_of.insert(device, root);
    }

    /// Walk parent pointers from `from` looking for `target`; returns the
    /// path `target ..= from` if found.
    fn ancestor_path(&self, from: DeviceId, target: DeviceId) -> Option<Vec<DeviceId>> {
        let mut path = vec![from];
        let mut cursor = from;
        while cursor != target {
            cursor = self.parent(cursor)?;
            path.push(cursor);
        }
        path.reverse();
        Some(path)
    }
}

/// Build the forest spanned by `edges` over `devices`.
///
/// `devices` should already be the active set and `edges` the deduplicated
/// canonical edges between them.
///
/// # Errors
///
/// - [`TopologyError::MalformedRecord`] if an edge names an unknown device.
/// - [`TopologyError::MultipleParents`] / [`TopologyError::CycleDetected`]
///   under [`ConflictPolicy::Reject`] when the edges are not a forest.
#[instrument(skip_all, fields(devices = devices.len(), edges = edges.len(), policy = ?policy))]
pub fn build_forest(
    devices: &[Device],
    edges: &[CanonicalEdge],
    policy: ConflictPolicy,
) -> Result<Forest, TopologyError> {
    let index = EdgeIndex::new(devices, edges)?;

    let mut ids: Vec<DeviceId> = devices.iter().map(|d| d.id).collect();
    ids.sort_unstable();
    ids.dedup();

    let mut forest = Forest {
        roots: ids.iter().copied().filter(|&id| !index.has_parent(id)).collect(),
        ..Forest::default()
    };

    let mut visited: HashSet<DeviceId> = HashSet::with_capacity(ids.len());
    for root in forest.roots.clone() {
        visited.insert(root);
        forest.tree_of.insert(root, root);

        let mut frontier = vec![root];
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for host in frontier {
                for attached in index.attached_to(host) {
                    if visited.insert(attached) {
                        forest.place(attached, host, root);
                        next.push(attached);
                        continue;
                    }

                    if policy == ConflictPolicy::Reject {
                        return Err(revisit_error(&forest, &index, host, attached));
                    }
                    warn!(
                        device = %attached,
                        ignored_parent = %host,
                        kept_parent = ?forest.parent(attached),
                        "device already placed; ignoring additional parent"
                    );
                }
            }
            frontier = next;
        }
    }

    let unplaced: Vec<DeviceId> = ids
        .iter()
        .copied()
        .filter(|id| !visited.contains(id))
        .collect();

    if !unplaced.is_empty() {
        match policy {
            ConflictPolicy::Reject => {
                let members = index
                    .cycles()
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| unplaced.clone());
                return Err(TopologyError::CycleDetected { members });
            }
            ConflictPolicy::Detach => {
                warn!(
                    count = unplaced.len(),
                    devices = ?unplaced,
                    "devices unreachable from any root; detaching"
                );
                forest.detached = unplaced;
            }
        }
    }

    debug!(
        roots = forest.roots.len(),
        placed = forest.placed_count(),
        detached = forest.detached.len(),
        "forest built"
    );

    Ok(forest)
}

/// Classify an edge that would place an already-placed device.
fn revisit_error(
    forest: &Forest,
    index: &EdgeIndex,
    host: DeviceId,
    attached: DeviceId,
) -> TopologyError {
    if let Some(mut members) = forest.ancestor_path(host, attached) {
        members.sort_unstable();
        return TopologyError::CycleDetected { members };
    }
    TopologyError::MultipleParents {
        device: attached,
        parents: index.hosts_of(attached),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DeviceStatus;

    fn devices(ids: &[u64]) -> Vec<Device> {
        ids.iter()
            .map(|&id| Device::new(DeviceId(id), DeviceStatus::Online))
            .collect()
    }

    fn edges(pairs: &[(u64, u64)]) -> Vec<CanonicalEdge> {
        pairs
            .iter()
            .map(|&(h, a)| CanonicalEdge {
                host: DeviceId(h),
                attached: DeviceId(a),
            })
            .collect()
    }

    fn ids(raw: &[u64]) -> Vec<DeviceId> {
        raw.iter().copied().map(DeviceId).collect()
    }

    #[test]
    fn roots_are_devices_without_parent_edges() {
        let forest = build_forest(
            &devices(&[1, 2, 3, 4, 5]),
            &edges(&[(1, 2), (1, 3), (3, 4)]),
            ConflictPolicy::Reject,
        )
        .expect("forest");

        assert_eq!(forest.roots(), ids(&[1, 5]).as_slice());
        assert_eq!(forest.parent(DeviceId(4)), Some(DeviceId(3)));
        assert_eq!(forest.parent(DeviceId(1)), None);
        assert_eq!(forest.children(DeviceId(1)), ids(&[2, 3]).as_slice());
        assert_eq!(forest.root_of(DeviceId(4)), Some(DeviceId(1)));
        assert_eq!(forest.root_of(DeviceId(5)), Some(DeviceId(5)));
        assert_eq!(forest.placed_count(), 5);
        assert!(forest.detached().is_empty());
    }

    #[test]
    fn second_parent_is_rejected() {
        let err = build_forest(
            &devices(&[1, 2, 3]),
            &edges(&[(1, 3), (2, 3)]),
            ConflictPolicy::Reject,
        )
        .expect_err("3 has two parents");

        assert_eq!(
            err,
            TopologyError::MultipleParents {
                device: DeviceId(3),
                parents: ids(&[1, 2]),
            }
        );
    }

    #[test]
    fn second_parent_is_skipped_when_detaching() {
        let forest = build_forest(
            &devices(&[1, 2, 3]),
            &edges(&[(1, 3), (2, 3)]),
            ConflictPolicy::Detach,
        )
        .expect("forest");

        assert_eq!(forest.parent(DeviceId(3)), Some(DeviceId(1)));
        assert!(forest.children(DeviceId(2)).is_empty());
    }

    #[test]
    fn rootless_cycle_is_reported() {
        // 1 -> 2 -> 3 -> 1, plus an unrelated root 9.
        let err = build_forest(
            &devices(&[1, 2, 3, 9]),
            &edges(&[(1, 2), (2, 3), (3, 1)]),
            ConflictPolicy::Reject,
        )
        .expect_err("cycle");

        assert_eq!(
            err,
            TopologyError::CycleDetected {
                members: ids(&[1, 2, 3]),
            }
        );
    }

    #[test]
    fn cycle_hanging_off_a_root_is_reported_as_cycle() {
        // 1 -> 2 -> 3 -> 4 -> 2
        let err = build_forest(
            &devices(&[1, 2, 3, 4]),
            &edges(&[(1, 2), (2, 3), (3, 4), (4, 2)]),
            ConflictPolicy::Reject,
        )
        .expect_err("cycle");

        assert_eq!(
            err,
            TopologyError::CycleDetected {
                members: ids(&[2, 3, 4]),
            }
        );
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let err = build_forest(&devices(&[4]), &edges(&[(4, 4)]), ConflictPolicy::Reject)
            .expect_err("self loop");
        assert_eq!(err, TopologyError::CycleDetected { members: ids(&[4]) });
    }

    #[test]
    fn unreachable_devices_are_detached() {
        // Cycle 1 <-> 2 <-> 3 with 3 -> 4 hanging below it; 10 is a lone root.
        let forest = build_forest(
            &devices(&[1, 2, 3, 4, 10]),
            &edges(&[(1, 2), (2, 3), (3, 1), (3, 4)]),
            ConflictPolicy::Detach,
        )
        .expect("forest");

        assert_eq!(forest.roots(), ids(&[10]).as_slice());
        assert_eq!(forest.detached(), ids(&[1, 2, 3, 4]).as_slice());
        assert_eq!(forest.root_of(DeviceId(4)), None);
    }

    #[test]
    fn edge_to_unknown_device_is_malformed() {
        let err = build_forest(&devices(&[1]), &edges(&[(1, 2)]), ConflictPolicy::Reject)
            .expect_err("ghost");
        assert!(matches!(err, TopologyError::MalformedRecord { .. }));
    }

    #[test]
    fn empty_input_builds_empty_forest() {
        let forest = build_forest(&[], &[], ConflictPolicy::Reject).expect("forest");
        assert!(forest.roots().is_empty());
        assert_eq!(forest.placed_count(), 0);
    }

    #[test]
    fn edge_index_reports_cycles_sorted() {
        let index = EdgeIndex::new(
            &devices(&[1, 2, 3, 5, 6]),
            &edges(&[(6, 5), (5, 6), (2, 1), (1, 2), (3, 3)]),
        )
        .expect("index");
        assert_eq!(index.cycles(), vec![ids(&[1, 2]), ids(&[3]), ids(&[5, 6])]);
        assert_eq!(index.hosts_of(DeviceId(5)), ids(&[6]));
        assert_eq!(index.attached_to(DeviceId(1)), ids(&[2]));
    }
}
