// ── API-to-domain type conversions ──
//
// Bridges raw `shelly_cloud_api` response types into `shelly_cloud_core::model`
// domain types. Unknown sensor objects and relay fields are dropped here.

use std::collections::BTreeMap;

use shelly_cloud_api::{RawDevice, RawDeviceStatus};
use strum::IntoEnumIterator;

use crate::model::{CloudState, Device, DeviceStatus, RelayState, SensorKind, SensorReading};

// ── Device ─────────────────────────────────────────────────────────

impl From<RawDevice> for Device {
    fn from(raw: RawDevice) -> Self {
        let name = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| raw.id.clone());

        Device {
            id: raw.id,
            name,
            channels_count: raw.channels_count.unwrap_or(0),
            device_type: raw.device_type,
            category: raw.category,
        }
    }
}

// ── Status ─────────────────────────────────────────────────────────

/// Build a `DeviceStatus` from the raw status keyed under `device_id`.
pub(crate) fn device_status(device_id: String, raw: &RawDeviceStatus) -> DeviceStatus {
    let cloud = raw
        .cloud
        .map(|c| CloudState {
            connected: c.connected,
            enabled: c.enabled,
        })
        .unwrap_or_default();

    let relays = raw
        .relays
        .iter()
        .map(|r| RelayState { is_on: r.ison })
        .collect();

    let sensors: BTreeMap<SensorKind, SensorReading> = SensorKind::iter()
        .filter_map(|kind| {
            raw.reading(kind.wire_key())
                .map(|value| (kind, SensorReading { value }))
        })
        .collect();

    DeviceStatus {
        device_id,
        cloud,
        relays,
        sensors,
    }
}
