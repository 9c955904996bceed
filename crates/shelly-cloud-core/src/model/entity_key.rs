// ── Entity identity ──
//
// An entity is one relay channel or one sensor reading of a device.
// `EntityKey` is what the discovered set deduplicates on.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::sensor::SensorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Channel(u32),
    Sensor(SensorKind),
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(n) => write!(f, "channel {n}"),
            Self::Sensor(kind) => write!(f, "{kind}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKey {
    pub device_id: String,
    pub kind: EntityKind,
}

impl EntityKey {
    pub fn channel(device_id: impl Into<String>, channel: u32) -> Self {
        Self {
            device_id: device_id.into(),
            kind: EntityKind::Channel(channel),
        }
    }

    pub fn sensor(device_id: impl Into<String>, kind: SensorKind) -> Self {
        Self {
            device_id: device_id.into(),
            kind: EntityKind::Sensor(kind),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device_id, self.kind)
    }
}

/// Published once per new `EntityKey`, carrying what a host needs to
/// build the entity without another lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredEntity {
    pub key: EntityKey,
    pub device_name: String,
    /// Relay channels on the device at discovery time.
    pub relay_count: u32,
}
