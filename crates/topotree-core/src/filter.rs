//! Restriction of devices and links to the active subset.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, instrument};

use crate::error::{RecordRef, TopologyError};
use crate::record::{Device, DeviceId, DeviceStatus, Link};

/// The set of statuses that count as "active".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityPolicy {
    statuses: BTreeSet<DeviceStatus>,
}

impl ActivityPolicy {
    #[must_use]
    pub fn new(statuses: impl IntoIterator<Item = DeviceStatus>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn is_active(&self, status: DeviceStatus) -> bool {
        self.statuses.contains(&status)
    }

    pub fn statuses(&self) -> impl Iterator<Item = DeviceStatus> + '_ {
        self.statuses.iter().copied()
    }
}

impl Default for ActivityPolicy {
    fn default() -> Self {
        Self::new([DeviceStatus::Online])
    }
}

/// Active devices and the links joining two active devices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveRecords {
    pub devices: Vec<Device>,
    pub links: Vec<Link>,
}

/// Keep active devices, and links whose endpoints are both active.
///
/// A link touching a known but inactive device is dropped. A link naming a
/// device absent from `devices` altogether is malformed.
///
/// # Errors
///
/// Returns [`TopologyError::MalformedRecord`] for the first link that
/// references an unknown device id.
#[instrument(skip_all, fields(devices = devices.len(), links = links.len()))]
pub fn filter_active(
    devices: &[Device],
    links: &[Link],
    policy: &ActivityPolicy,
) -> Result<ActiveRecords, TopologyError> {
    let known: HashSet<DeviceId> = devices.iter().map(|d| d.id).collect();
    let active: Vec<Device> = devices
        .iter()
        .filter(|d| policy.is_active(d.status))
        .cloned()
        .collect();
    let active_ids: HashSet<DeviceId> = active.iter().map(|d| d.id).collect();

    let mut kept = Vec::with_capacity(links.len());
    for (index, link) in links.iter().enumerate() {
        for endpoint in [link.host, link.attached] {
            if !known.contains(&endpoint) {
                return Err(TopologyError::malformed(
                    RecordRef::Link {
                        index,
                        host: Some(link.host),
                        attached: Some(link.attached),
                    },
                    format!("references unknown device {endpoint}"),
                ));
            }
        }
        if active_ids.contains(&link.host) && active_ids.contains(&link.attached) {
            kept.push(*link);
        }
    }

    debug!(
        active_devices = active.len(),
        active_links = kept.len(),
        "filtered to active records"
    );

    Ok(ActiveRecords {
        devices: active,
        links: kept,
    })
}
