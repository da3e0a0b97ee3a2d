//! End-to-end pipeline wiring the six stages together.
//!
//! ```text
//! devices, links
//!        ↓  filter::filter_active()
//! ActiveRecords
//!        ↓  dedup::dedup_links()
//! Vec<CanonicalEdge>
//!        ↓  forest::build_forest()
//! Forest
//!        ├─ rank::rank_roots()     → Ranking
//!        └─ annotate::annotate()   → Vec<Annotation>
//!        ↓  assemble::assemble()
//! Vec<ResultRow>
//! ```
//!
//! Each call owns all of its intermediate state, so independent inputs can
//! be processed concurrently.

use serde::Serialize;
use tracing::{info, instrument};

use crate::annotate::annotate;
use crate::assemble::{ResultRow, assemble};
use crate::basic::{BasicRow, assemble_basic};
use crate::dedup::{dedup_links, edge_set_hash};
use crate::error::TopologyError;
use crate::filter::{ActivityPolicy, filter_active};
use crate::forest::{ConflictPolicy, build_forest};
use crate::rank::{PhaseNumbering, RootRank, rank_roots};
use crate::record::{Device, DeviceId, Link};

/// Knobs for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub activity: ActivityPolicy,
    pub conflicts: ConflictPolicy,
    pub phases: PhaseNumbering,
}

/// Output of [`build_topology`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyReport {
    /// Report rows in final order.
    pub rows: Vec<ResultRow>,
    /// Ranking table, in `(rank, root id)` order.
    pub roots: Vec<RootRank>,
    /// Devices reported as isolated because no root reached them.
    pub detached: Vec<DeviceId>,
    /// Hash of the canonical edge set.
    pub edge_hash: String,
}

/// Output of [`build_basic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BasicReport {
    pub rows: Vec<BasicRow>,
    pub edge_hash: String,
}

/// Run the full pipeline.
///
/// # Errors
///
/// Returns [`TopologyError::MalformedRecord`] for links to unknown devices,
/// and the structural errors from [`build_forest`] under
/// [`ConflictPolicy::Reject`].
#[instrument(skip_all, fields(devices = devices.len(), links = links.len()))]
pub fn build_topology(
    devices: &[Device],
    links: &[Link],
    options: &PipelineOptions,
) -> Result<TopologyReport, TopologyError> {
    let active = filter_active(devices, links, &options.activity)?;
    let edges = dedup_links(&active.links);
    let forest = build_forest(&active.devices, &edges, options.conflicts)?;
    let ranking = rank_roots(&forest, options.phases);
    let annotations = annotate(&forest);
    let rows = assemble(&active.devices, &annotations, &ranking);

    info!(
        rows = rows.len(),
        roots = ranking.roots().len(),
        phases = ranking.catch_all_phase(),
        detached = forest.detached().len(),
        "topology built"
    );

    Ok(TopologyReport {
        rows,
        roots: ranking.into_roots(),
        detached: forest.detached().to_vec(),
        edge_hash: edge_set_hash(&edges),
    })
}

/// Run the filter and dedup stages and emit the flat connectivity report.
///
/// # Errors
///
/// Returns [`TopologyError::MalformedRecord`] for links to unknown devices.
#[instrument(skip_all, fields(devices = devices.len(), links = links.len()))]
pub fn build_basic(
    devices: &[Device],
    links: &[Link],
    options: &PipelineOptions,
) -> Result<BasicReport, TopologyError> {
    let active = filter_active(devices, links, &options.activity)?;
    let edges = dedup_links(&active.links);
    let rows = assemble_basic(&active.devices, &edges);

    info!(rows = rows.len(), edges = edges.len(), "basic report built");

    Ok(BasicReport {
        rows,
        edge_hash: edge_set_hash(&edges),
    })
}

/// The parent links expressed by a finished report.
#[must_use]
pub fn edges_from_rows(rows: &[ResultRow]) -> Vec<Link> {
    rows.iter()
        .filter_map(|row| row.connected_to.map(|host| Link::new(host, row.device_id)))
        .collect()
}
