//! Final report rows: device attributes joined with Function, Phase and parent.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::annotate::Annotation;
use crate::rank::Ranking;
use crate::record::{Device, DeviceId};

/// One report row. Field order is the column order of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "Device ID")]
    pub device_id: DeviceId,
    #[serde(rename = "Device Name")]
    pub device_name: Option<String>,
    #[serde(rename = "Connected to Device ID")]
    pub connected_to: Option<DeviceId>,
    #[serde(rename = "Device Type")]
    pub device_type: Option<String>,
    #[serde(rename = "Function")]
    pub function: u32,
    #[serde(rename = "Phase")]
    pub phase: u32,
    #[serde(rename = "Model")]
    pub model: Option<String>,
    #[serde(rename = "Vendor")]
    pub vendor: Option<String>,
    #[serde(rename = "IP")]
    pub ip: Option<String>,
    #[serde(rename = "MAC")]
    pub mac: Option<String>,
}

impl ResultRow {
    pub const COLUMNS: [&'static str; 10] = [
        "Device ID",
        "Device Name",
        "Connected to Device ID",
        "Device Type",
        "Function",
        "Phase",
        "Model",
        "Vendor",
        "IP",
        "MAC",
    ];

    fn sort_key(&self) -> (u32, u32, Option<DeviceId>, DeviceId) {
        (self.phase, self.function, self.connected_to, self.device_id)
    }
}

/// Join annotations and phases onto `devices`, one row per device.
///
/// A device without an annotation (detached, or otherwise unplaced) is
/// reported as its own root: Function 0, no parent, catch-all phase.
///
/// Rows are sorted by `(Phase, Function, parent id, device id)`, with an
/// absent parent ordering first.
#[must_use]
#[instrument(skip_all, fields(devices = devices.len(), annotations = annotations.len()))]
pub fn assemble(devices: &[Device], annotations: &[Annotation], ranking: &Ranking) -> Vec<ResultRow> {
    let by_device: HashMap<DeviceId, &Annotation> =
        annotations.iter().map(|a| (a.device, a)).collect();
    let catch_all = ranking.catch_all_phase();

    let mut unplaced = 0usize;
    let mut rows: Vec<ResultRow> = devices
        .iter()
        .map(|device| {
            let (function, connected_to, phase) = match by_device.get(&device.id) {
                Some(a) => (
                    a.function,
                    a.parent,
                    ranking.phase_of(a.root).unwrap_or(catch_all),
                ),
                None => {
                    unplaced += 1;
                    (0, None, catch_all)
                }
            };
            ResultRow {
                device_id: device.id,
                device_name: device.name.clone(),
                connected_to,
                device_type: device.type_label.clone(),
                function,
                phase,
                model: device.model.clone(),
                vendor: device.vendor.clone(),
                ip: device.ip.clone(),
                mac: device.mac.clone(),
            }
        })
        .collect();

    rows.sort_by_key(ResultRow::sort_key);

    debug!(rows = rows.len(), unplaced, "assembled report rows");
    rows
}
