//! Error taxonomy for the topology pipeline.
//!
//! Every failure aborts the whole computation; there is no partial output.
//! Each [`TopologyError`] maps onto a stable [`ErrorCode`] so callers can
//! render machine-readable diagnostics without matching on message text.

use std::fmt;

use crate::record::DeviceId;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    MalformedRecord,
    CycleDetected,
    MultipleParents,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MalformedRecord => "E1001",
            Self::CycleDetected => "E2001",
            Self::MultipleParents => "E2002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MalformedRecord => "Malformed device or link record",
            Self::CycleDetected => "Link cycle detected",
            Self::MultipleParents => "Device has more than one parent",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::MalformedRecord => {
                Some("Check that every device has an id and status and every link names known devices.")
            }
            Self::CycleDetected => Some("Remove one of the links in the cycle, or rerun with --detach."),
            Self::MultipleParents => {
                Some("Keep a single upstream link for the device, or rerun with --detach.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Identifies the input record an error refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRef {
    /// Position in the device stream, plus its id if it had one.
    Device { index: usize, id: Option<DeviceId> },
    /// Position in the link stream, plus whatever endpoints it carried.
    Link {
        index: usize,
        host: Option<DeviceId>,
        attached: Option<DeviceId>,
    },
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device { index, id: Some(id) } => write!(f, "device #{index} (id {id})"),
            Self::Device { index, id: None } => write!(f, "device #{index}"),
            Self::Link {
                index,
                host,
                attached,
            } => write!(
                f,
                "link #{index} ({} -> {})",
                display_opt(*host),
                display_opt(*attached)
            ),
        }
    }
}

fn display_opt(id: Option<DeviceId>) -> String {
    id.map_or_else(|| "?".to_string(), |id| id.to_string())
}

fn join_ids(ids: &[DeviceId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while turning device and link records into a forest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    /// A record is missing a required field or references an unknown device.
    #[error("malformed {record}: {reason}")]
    MalformedRecord { record: RecordRef, reason: String },

    /// Canonical edges close a loop; `members` are sorted device ids.
    #[error("link cycle detected among devices [{}]", join_ids(.members))]
    CycleDetected { members: Vec<DeviceId> },

    /// A device would be placed under more than one parent.
    #[error("device {device} is attached to more than one parent [{}]", join_ids(.parents))]
    MultipleParents {
        device: DeviceId,
        parents: Vec<DeviceId>,
    },
}

impl TopologyError {
    pub(crate) fn malformed(record: RecordRef, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record,
            reason: reason.into(),
        }
    }

    /// The stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedRecord { .. } => ErrorCode::MalformedRecord,
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
            Self::MultipleParents { .. } => ErrorCode::MultipleParents,
        }
    }

    /// `true` for the cycle / multi-parent class: the records decoded fine
    /// but do not describe a forest.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::CycleDetected { .. } | Self::MultipleParents { .. }
        )
    }
}
