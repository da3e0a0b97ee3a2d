//! Reading device and link exports from disk.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context as _, Result};
use serde::de::DeserializeOwned;
use topotree_core::{Device, Link, RawDevice, RawLink, decode_devices, decode_links};
use tracing::debug;

/// Decode a JSON array of `T` from `path`.
pub fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let records: Vec<T> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to decode JSON array in {}", path.display()))?;
    debug!(path = %path.display(), records = records.len(), "read input");
    Ok(records)
}

/// Read and validate both input streams.
pub fn load_records(devices: &Path, topology: &Path) -> Result<(Vec<Device>, Vec<Link>)> {
    let raw_devices: Vec<RawDevice> = read_json_array(devices)?;
    let raw_links: Vec<RawLink> = read_json_array(topology)?;
    Ok((decode_devices(raw_devices)?, decode_links(raw_links)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use topotree_core::{DeviceId, DeviceStatus, TopologyError};

    #[test]
    fn loads_export_shaped_files() {
        let dir = TempDir::new().expect("tempdir");
        let devices = dir.path().join("device.json");
        let topology = dir.path().join("network-topology.json");
        std::fs::write(
            &devices,
            r#"[{"id": 1, "status": "ONLINE", "type": {"label": "Router"}},
               {"id": 2, "status": "HIDDEN", "name": "spare"}]"#,
        )
        .expect("write devices");
        std::fs::write(&topology, r#"[{"host_device_id": 1, "attached_device_id": 2}]"#)
            .expect("write topology");

        let (devices, links) = load_records(&devices, &topology).expect("load");
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].type_label.as_deref(), Some("Router"));
        assert_eq!(devices[1].status, DeviceStatus::Hidden);
        assert_eq!(links, vec![Link::new(DeviceId(1), DeviceId(2))]);
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("nope.json");
        let err = read_json_array::<RawDevice>(&missing).unwrap_err();
        assert!(format!("{err}").contains("nope.json"));
    }

    #[test]
    fn invalid_record_surfaces_topology_error() {
        let dir = TempDir::new().expect("tempdir");
        let devices = dir.path().join("device.json");
        let topology = dir.path().join("links.json");
        std::fs::write(&devices, r#"[{"id": 1, "status": "ONLINE"}]"#).expect("write");
        std::fs::write(&topology, r#"[{"host_device_id": 1}]"#).expect("write");

        let err = load_records(&devices, &topology).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TopologyError>(),
            Some(TopologyError::MalformedRecord { .. })
        ));
    }
}
