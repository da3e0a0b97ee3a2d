//! Device and link records.
//!
//! Callers decode their input format into [`RawDevice`] / [`RawLink`] (every
//! field optional, unknown fields ignored) and hand them to
//! [`decode_devices`] / [`decode_links`], which enforce the required fields
//! and produce the typed [`Device`] / [`Link`] values the pipeline consumes.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RecordRef, TopologyError};

// ---------------------------------------------------------------------------
// Identity and status
// ---------------------------------------------------------------------------

/// Unique, ordered device key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub u64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DeviceId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Reported reachability of a device.
///
/// Unrecognized values decode as [`DeviceStatus::Unknown`] rather than
/// failing, so new upstream states never abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceStatus {
    Online,
    Offline,
    Down,
    Hidden,
    #[serde(other)]
    Unknown,
}

impl DeviceStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
            Self::Down => "DOWN",
            Self::Hidden => "HIDDEN",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Raw (decoded, unvalidated) records
// ---------------------------------------------------------------------------

/// The `type` object attached to a device; only the label is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDeviceType {
    #[serde(default)]
    pub label: Option<String>,
}

/// A device record as decoded from input, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDevice {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    /// Stale "connected to" value from the export; superseded by the
    /// computed parent and never read by the pipeline.
    #[serde(default)]
    pub host_device_id: Option<u64>,
    #[serde(default, rename = "type")]
    pub device_type: Option<RawDeviceType>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub mac: Option<String>,
    #[serde(default)]
    pub status: Option<DeviceStatus>,
}

/// A host/attached link as decoded from input, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLink {
    #[serde(default)]
    pub host_device_id: Option<u64>,
    #[serde(default)]
    pub attached_device_id: Option<u64>,
}

// ---------------------------------------------------------------------------
// Validated records
// ---------------------------------------------------------------------------

/// A validated network device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: DeviceId,
    pub name: Option<String>,
    pub type_label: Option<String>,
    pub model: Option<String>,
    pub vendor: Option<String>,
    pub ip: Option<String>,
    pub mac: Option<String>,
    pub status: DeviceStatus,
}

impl Device {
    /// Minimal constructor used by tests and callers that build records in code.
    #[must_use]
    pub const fn new(id: DeviceId, status: DeviceStatus) -> Self {
        Self {
            id,
            name: None,
            type_label: None,
            model: None,
            vendor: None,
            ip: None,
            mac: None,
            status,
        }
    }

    /// Validate the `index`-th raw device.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::MalformedRecord`] if `id` or `status` is missing.
    pub fn from_raw(index: usize, raw: RawDevice) -> Result<Self, TopologyError> {
        let id = raw.id.map(DeviceId);
        let record = RecordRef::Device { index, id };

        let Some(id) = id else {
            return Err(TopologyError::malformed(record, "missing id"));
        };
        let Some(status) = raw.status else {
            return Err(TopologyError::malformed(record, "missing status"));
        };

        Ok(Self {
            id,
            name: raw.name,
            type_label: raw.device_type.and_then(|t| t.label),
            model: raw.model,
            vendor: raw.vendor,
            ip: raw.ip,
            mac: raw.mac,
            status,
        })
    }
}

/// "`attached` is connected to `host`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Link {
    pub host: DeviceId,
    pub attached: DeviceId,
}

impl Link {
    #[must_use]
    pub const fn new(host: DeviceId, attached: DeviceId) -> Self {
        Self { host, attached }
    }

    /// Validate the `index`-th raw link.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::MalformedRecord`] if either endpoint is missing.
    pub fn from_raw(index: usize, raw: RawLink) -> Result<Self, TopologyError> {
        let host = raw.host_device_id.map(DeviceId);
        let attached = raw.attached_device_id.map(DeviceId);

        match (host, attached) {
            (Some(host), Some(attached)) => Ok(Self { host, attached }),
            (None, _) => Err(TopologyError::malformed(
                RecordRef::Link {
                    index,
                    host,
                    attached,
                },
                "missing host_device_id",
            )),
            (Some(_), None) => Err(TopologyError::malformed(
                RecordRef::Link {
                    index,
                    host,
                    attached,
                },
                "missing attached_device_id",
            )),
        }
    }
}

/// Validate a device stream. Device ids must be unique.
///
/// # Errors
///
/// Returns [`TopologyError::MalformedRecord`] for the first record missing a
/// required field or repeating an earlier id.
pub fn decode_devices<I>(raw: I) -> Result<Vec<Device>, TopologyError>
where
    I: IntoIterator<Item = RawDevice>,
{
    let mut seen = HashSet::new();
    raw.into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let device = Device::from_raw(index, raw)?;
            if !seen.insert(device.id) {
                return Err(TopologyError::malformed(
                    RecordRef::Device {
                        index,
                        id: Some(device.id),
                    },
                    "duplicate device id",
                ));
            }
            Ok(device)
        })
        .collect()
}

/// Validate a link stream.
///
/// # Errors
///
/// Returns [`TopologyError::MalformedRecord`] for the first link missing an
/// endpoint.
pub fn decode_links<I>(raw: I) -> Result<Vec<Link>, TopologyError>
where
    I: IntoIterator<Item = RawLink>,
{
    raw.into_iter()
        .enumerate()
        .map(|(index, raw)| Link::from_raw(index, raw))
        .collect()
}
