#![forbid(unsafe_code)]
//! topotree-core library.
//!
//! Turns flat device and host/attached link records into a ranked forest:
//! every active device gets the id of its parent, its depth in its tree
//! ("Function"), and the ordinal of its tree ("Phase").
//!
//! # Conventions
//!
//! - **Errors**: Fallible stages return [`TopologyError`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`).
//!
//! # Typical usage
//!
//! ```rust,ignore
//! use topotree_core::{PipelineOptions, build_topology, decode_devices, decode_links};
//!
//! let devices = decode_devices(raw_devices)?;
//! let links = decode_links(raw_links)?;
//! let report = build_topology(&devices, &links, &PipelineOptions::default())?;
//! for row in &report.rows {
//!     println!("{} phase={} function={}", row.device_id, row.phase, row.function);
//! }
//! ```

pub mod annotate;
pub mod assemble;
pub mod basic;
pub mod dedup;
pub mod error;
pub mod filter;
pub mod forest;
pub mod pipeline;
pub mod rank;
pub mod record;

pub use assemble::ResultRow;
pub use basic::BasicRow;
pub use dedup::CanonicalEdge;
pub use error::{ErrorCode, RecordRef, TopologyError};
pub use filter::ActivityPolicy;
pub use forest::{ConflictPolicy, Forest};
pub use pipeline::{
    BasicReport, PipelineOptions, TopologyReport, build_basic, build_topology, edges_from_rows,
};
pub use rank::{PhaseNumbering, RootRank};
pub use record::{
    Device, DeviceId, DeviceStatus, Link, RawDevice, RawDeviceType, RawLink, decode_devices,
    decode_links,
};
