// ── Device status domain types ──

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::sensor::SensorKind;

/// Cloud connectivity of a device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudState {
    pub connected: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayState {
    pub is_on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub value: f64,
}

/// Last polled status of one device. Replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub device_id: String,
    pub cloud: CloudState,
    /// Relay channels in channel order.
    pub relays: Vec<RelayState>,
    pub sensors: BTreeMap<SensorKind, SensorReading>,
}

impl DeviceStatus {
    /// A device is available while the cloud reports it connected.
    pub fn is_available(&self) -> bool {
        self.cloud.connected
    }

    /// `false` for channels the device does not have.
    pub fn relay_is_on(&self, channel: u32) -> bool {
        usize::try_from(channel)
            .ok()
            .and_then(|idx| self.relays.get(idx))
            .is_some_and(|relay| relay.is_on)
    }

    pub fn sensor(&self, kind: SensorKind) -> Option<f64> {
        self.sensors.get(&kind).map(|reading| reading.value)
    }

    /// Overwrite a channel's state. Returns `false` if the channel does not exist.
    pub(crate) fn set_relay(&mut self, channel: u32, is_on: bool) -> bool {
        match usize::try_from(channel)
            .ok()
            .and_then(|idx| self.relays.get_mut(idx))
        {
            Some(relay) => {
                relay.is_on = is_on;
                true
            }
            None => false,
        }
    }
}
