//! Flat connectivity report: each active device with the host(s) it is
//! attached to, without Function/Phase.
//!
//! No forest is built, so a device with several canonical parents simply
//! gets one row per parent instead of being rejected.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::dedup::CanonicalEdge;
use crate::record::{Device, DeviceId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicRow {
    #[serde(rename = "Device ID")]
    pub device_id: DeviceId,
    #[serde(rename = "Device Name")]
    pub device_name: Option<String>,
    #[serde(rename = "Connected to Device ID")]
    pub connected_to: Option<DeviceId>,
    #[serde(rename = "Device Type")]
    pub device_type: Option<String>,
    #[serde(rename = "Model")]
    pub model: Option<String>,
    #[serde(rename = "Vendor")]
    pub vendor: Option<String>,
    #[serde(rename = "IP")]
    pub ip: Option<String>,
    #[serde(rename = "MAC")]
    pub mac: Option<String>,
}

impl BasicRow {
    pub const COLUMNS: [&'static str; 8] = [
        "Device ID",
        "Device Name",
        "Connected to Device ID",
        "Device Type",
        "Model",
        "Vendor",
        "IP",
        "MAC",
    ];

    fn new(device: &Device, connected_to: Option<DeviceId>) -> Self {
        Self {
            device_id: device.id,
            device_name: device.name.clone(),
            connected_to,
            device_type: device.type_label.clone(),
            model: device.model.clone(),
            vendor: device.vendor.clone(),
            ip: device.ip.clone(),
            mac: device.mac.clone(),
        }
    }
}

/// Left-join `devices` onto the edges where they are the attached end.
/// Rows are sorted by `(device id, parent id)`.
#[must_use]
#[instrument(skip_all, fields(devices = devices.len(), edges = edges.len()))]
pub fn assemble_basic(devices: &[Device], edges: &[CanonicalEdge]) -> Vec<BasicRow> {
    let mut hosts: HashMap<DeviceId, Vec<DeviceId>> = HashMap::new();
    for edge in edges {
        hosts.entry(edge.attached).or_default().push(edge.host);
    }

    let mut rows = Vec::with_capacity(devices.len());
    for device in devices {
        match hosts.get(&device.id) {
            Some(parents) => {
                rows.extend(parents.iter().map(|&p| BasicRow::new(device, Some(p))));
            }
            None => rows.push(BasicRow::new(device, None)),
        }
    }
    rows.sort_by_key(|r| (r.device_id, r.connected_to));

    debug!(rows = rows.len(), "assembled basic rows");
    rows
}
