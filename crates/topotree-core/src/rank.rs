//! Root ranking and phase assignment.
//!
//! Each root is scored by the shape of its tree: `depth` (longest
//! root-to-device path, in edges) and `size` (devices below the root, direct
//! and indirect). Roots are dense-ranked by `(depth, size)` descending; ties
//! share a rank, and equal-rank roots are ordered by ascending root id.
//!
//! Roots whose tree has depth 0 are isolated devices. They never take part
//! in the normal phase numbering and all land in one trailing catch-all
//! phase, numbered one past the highest phase given to a real tree (or 1 if
//! there are none).

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::forest::Forest;
use crate::record::DeviceId;

/// How phases are numbered across roots with depth > 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseNumbering {
    /// Phase equals the dense rank: roots with equal `(depth, size)` share a phase.
    #[default]
    Shared,
    /// One phase per tree, numbered 1.. in rank order.
    Sequential,
}

/// Ranking entry for one root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RootRank {
    pub root: DeviceId,
    pub depth: u32,
    pub size: u32,
    pub rank: u32,
    pub phase: u32,
}

/// Roots in rank order, plus the catch-all phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    roots: Vec<RootRank>,
    phase_by_root: HashMap<DeviceId, u32>,
    catch_all_phase: u32,
}

impl Ranking {
    /// Roots sorted by `(rank, root id)`.
    #[must_use]
    pub fn roots(&self) -> &[RootRank] {
        &self.roots
    }

    #[must_use]
    pub fn phase_of(&self, root: DeviceId) -> Option<u32> {
        self.phase_by_root.get(&root).copied()
    }

    /// The phase holding isolated and detached devices.
    #[must_use]
    pub const fn catch_all_phase(&self) -> u32 {
        self.catch_all_phase
    }

    #[must_use]
    pub fn into_roots(self) -> Vec<RootRank> {
        self.roots
    }
}

/// Depth and size of the tree rooted at `root`.
#[must_use]
pub fn tree_shape(forest: &Forest, root: DeviceId) -> (u32, u32) {
    let mut depth = 0u32;
    let mut size = 0u32;
    let mut stack = vec![(root, 0u32)];

    while let Some((id, level)) = stack.pop() {
        depth = depth.max(level);
        for &child in forest.children(id) {
            size += 1;
            stack.push((child, level + 1));
        }
    }

    (depth, size)
}

/// Rank every root of `forest` and assign phases.
#[must_use]
#[instrument(skip_all, fields(roots = forest.roots().len(), numbering = ?numbering))]
pub fn rank_roots(forest: &Forest, numbering: PhaseNumbering) -> Ranking {
    let mut roots: Vec<RootRank> = forest
        .roots()
        .iter()
        .map(|&root| {
            let (depth, size) = tree_shape(forest, root);
            RootRank {
                root,
                depth,
                size,
                rank: 0,
                phase: 0,
            }
        })
        .collect();

    let mut keys: Vec<(u32, u32)> = roots.iter().map(|r| (r.depth, r.size)).collect();
    keys.sort_unstable_by(|a, b| b.cmp(a));
    keys.dedup();
    let dense: HashMap<(u32, u32), u32> = keys.into_iter().zip(1u32..).collect();

    for entry in &mut roots {
        entry.rank = dense[&(entry.depth, entry.size)];
    }
    roots.sort_by(|a, b| a.rank.cmp(&b.rank).then_with(|| a.root.cmp(&b.root)));

    let mut highest = 0u32;
    for (position, entry) in (1u32..).zip(roots.iter_mut().filter(|r| r.depth > 0)) {
        entry.phase = match numbering {
            PhaseNumbering::Shared => entry.rank,
            PhaseNumbering::Sequential => position,
        };
        highest = highest.max(entry.phase);
    }

    let catch_all_phase = highest + 1;
    for entry in roots.iter_mut().filter(|r| r.depth == 0) {
        entry.phase = catch_all_phase;
    }

    let phase_by_root = roots.iter().map(|r| (r.root, r.phase)).collect();

    debug!(ranked = roots.len(), catch_all_phase, "ranked roots");

    Ranking {
        roots,
        phase_by_root,
        catch_all_phase,
    }
}
