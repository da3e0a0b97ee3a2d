//! Collapse of duplicate links into one canonical directed edge per device pair.
//!
//! Links are grouped by their unordered endpoint pair. Within a group the
//! link(s) with the smallest host id win; since every surviving link then has
//! the same host and, by construction of the pair, the same attached device,
//! each group yields exactly one [`CanonicalEdge`].
//!
//! ```text
//! (1 -> 2), (2 -> 1), (1 -> 2)   pair {1,2}, min host 1   =>  1 -> 2
//! (3 -> 4)                       pair {3,4}, min host 3   =>  3 -> 4
//! (9 -> 5)                       pair {5,9}, min host 9   =>  9 -> 5
//! ```

#![allow(clippy::module_name_repetitions)]

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::record::{DeviceId, Link};

/// Unordered device pair, stored low id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    low: DeviceId,
    high: DeviceId,
}

impl PairKey {
    #[must_use]
    pub fn of(a: DeviceId, b: DeviceId) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    #[must_use]
    pub const fn low(self) -> DeviceId {
        self.low
    }

    #[must_use]
    pub const fn high(self) -> DeviceId {
        self.high
    }

    /// The endpoint that is not `id`. For a self-pair this is `id` itself.
    #[must_use]
    pub fn other(self, id: DeviceId) -> DeviceId {
        if id == self.low { self.high } else { self.low }
    }
}

/// The surviving `host -> attached` edge for one device pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CanonicalEdge {
    pub host: DeviceId,
    pub attached: DeviceId,
}

impl CanonicalEdge {
    #[must_use]
    pub fn pair(self) -> PairKey {
        PairKey::of(self.host, self.attached)
    }
}

impl From<CanonicalEdge> for Link {
    fn from(edge: CanonicalEdge) -> Self {
        Self::new(edge.host, edge.attached)
    }
}

/// Reduce `links` to one canonical edge per unordered device pair.
///
/// The result is sorted by pair key, so it is independent of input order.
#[must_use]
#[instrument(skip_all, fields(links = links.len()))]
pub fn dedup_links(links: &[Link]) -> Vec<CanonicalEdge> {
    // pair -> minimum host id seen for that pair
    let mut min_host: BTreeMap<PairKey, DeviceId> = BTreeMap::new();

    for link in links {
        min_host
            .entry(PairKey::of(link.host, link.attached))
            .and_modify(|host| *host = (*host).min(link.host))
            .or_insert(link.host);
    }

    let edges: Vec<CanonicalEdge> = min_host
        .into_iter()
        .map(|(pair, host)| CanonicalEdge {
            host,
            attached: pair.other(host),
        })
        .collect();

    debug!(
        canonical = edges.len(),
        superseded = links.len() - edges.len(),
        "deduplicated links"
    );

    edges
}

/// BLAKE3 hash of a canonical edge set, for detecting topology changes
/// between runs. Order-insensitive.
#[must_use]
pub fn edge_set_hash(edges: &[CanonicalEdge]) -> String {
    let mut sorted = edges.to_vec();
    sorted.sort_unstable();

    let mut hasher = blake3::Hasher::new();
    for edge in &sorted {
        hasher.update(&edge.host.0.to_le_bytes());
        hasher.update(b"\x00");
        hasher.update(&edge.attached.0.to_le_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}
