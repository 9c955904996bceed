//! Device list command handler.

use serde::Serialize;
use tabled::Tabled;

use shelly_cloud_core::Bridge;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::Output;

// ── Summary ─────────────────────────────────────────────────────────

/// One device joined with its cloud connectivity, for every output format.
#[derive(Debug, Serialize)]
struct DeviceSummary {
    id: String,
    name: String,
    device_type: Option<String>,
    channels: u32,
    online: bool,
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    device_type: String,
    #[tabled(rename = "Channels")]
    channels: u32,
    #[tabled(rename = "Online")]
    online: String,
}

impl DeviceRow {
    fn new(d: &DeviceSummary, out: &Output) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            device_type: d.device_type.clone().unwrap_or_default(),
            channels: d.channels,
            online: out.flag(d.online, "yes", "no"),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(bridge: &Bridge, global: &GlobalOpts) -> Result<(), CliError> {
    let devices: Vec<DeviceSummary> = bridge
        .devices_snapshot()
        .values()
        .map(|d| DeviceSummary {
            id: d.id.clone(),
            name: d.name.clone(),
            device_type: d.device_type.clone(),
            channels: d.channels_count,
            online: bridge.availability(&d.id),
        })
        .collect();

    let out = Output::new(global);
    out.list(&devices, |d| DeviceRow::new(d, &out), |d| d.id.clone())
}
