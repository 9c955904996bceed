//! Status command handler: relay and sensor readings per device.

use std::fmt::Write as _;

use serde::Serialize;
use tabled::Tabled;

use shelly_cloud_core::{Bridge, DeviceStatus, SensorKind, Turn};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output::Output;

use super::require_device;

// ── Summary ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SensorValue {
    kind: SensorKind,
    value: f64,
    unit: &'static str,
}

#[derive(Debug, Serialize)]
struct StatusSummary {
    id: String,
    name: String,
    online: bool,
    relays: Vec<bool>,
    sensors: Vec<SensorValue>,
}

impl StatusSummary {
    fn new(id: &str, name: &str, status: Option<&DeviceStatus>) -> Self {
        let Some(status) = status else {
            return Self {
                id: id.to_owned(),
                name: name.to_owned(),
                online: false,
                relays: Vec::new(),
                sensors: Vec::new(),
            };
        };

        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            online: status.is_available(),
            relays: status.relays.iter().map(|r| r.is_on).collect(),
            sensors: status
                .sensors
                .iter()
                .map(|(kind, reading)| SensorValue {
                    kind: *kind,
                    value: reading.value,
                    unit: kind.spec().unit,
                })
                .collect(),
        }
    }

    fn relay_text(&self) -> String {
        self.relays
            .iter()
            .map(|on| Turn::from(*on).to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn sensor_text(&self, sep: &str) -> String {
        self.sensors
            .iter()
            .map(|s| format!("{} {}{}", s.kind, s.kind.format_value(s.value), s.unit))
            .collect::<Vec<_>>()
            .join(sep)
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Online")]
    online: String,
    #[tabled(rename = "Relays")]
    relays: String,
    #[tabled(rename = "Sensors")]
    sensors: String,
}

impl StatusRow {
    fn new(s: &StatusSummary, out: &Output) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            online: out.flag(s.online, "yes", "no"),
            relays: s.relay_text(),
            sensors: s.sensor_text(", "),
        }
    }
}

fn detail(s: &StatusSummary, style: &Output) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID:      {}", s.id);
    let _ = writeln!(out, "Name:    {}", s.name);
    let _ = writeln!(out, "Online:  {}", style.flag(s.online, "yes", "no"));
    for (channel, on) in s.relays.iter().enumerate() {
        let state = Turn::from(*on).to_string();
        let _ = writeln!(
            out,
            "Relay {channel}: {}",
            style.flag(*on, &state, &state)
        );
    }
    for sensor in &s.sensors {
        let _ = writeln!(
            out,
            "{:<8} {}{}",
            format!("{}:", sensor.kind),
            sensor.kind.format_value(sensor.value),
            sensor.unit
        );
    }
    out.trim_end().to_owned()
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(bridge: &Bridge, args: &StatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let out = Output::new(global);

    if let Some(id) = &args.device {
        require_device(bridge, id)?;
        let name = bridge.device(id).map(|d| d.name.clone()).unwrap_or_default();
        let status = bridge.device_status(id);
        let summary = StatusSummary::new(id, &name, status.as_deref());

        return out.single(&summary, |s| detail(s, &out), |s| s.id.clone());
    }

    let statuses = bridge.statuses_snapshot();
    let summaries: Vec<StatusSummary> = bridge
        .devices_snapshot()
        .values()
        .map(|d| StatusSummary::new(&d.id, &d.name, statuses.get(&d.id).map(AsRef::as_ref)))
        .collect();

    out.list(
        &summaries,
        |s| StatusRow::new(s, &out),
        |s| format!("{}\t{}", s.id, s.relay_text()),
    )
}
