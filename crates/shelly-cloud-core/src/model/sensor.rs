// ── Sensor kinds and their display table ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Every sensor reading the bridge knows how to surface.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SensorKind {
    Battery,
    Humidity,
    Temperature,
    Power,
    Current,
    Voltage,
}

/// Fixed presentation data for one sensor kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSpec {
    /// Key of the reading object in a device status (`"tmp"`, `"bat"`, ...).
    pub wire_key: &'static str,
    /// Suffix of the sensor's entity id.
    pub entity_suffix: &'static str,
    pub unit: &'static str,
    pub icon: &'static str,
    /// Multiplier applied to the raw reading before display.
    pub factor: f64,
    /// Digits after the decimal point in the displayed state.
    pub decimals: usize,
}

const BATTERY: SensorSpec = SensorSpec {
    wire_key: "bat",
    entity_suffix: "battery",
    unit: "%",
    icon: "mdi:battery",
    factor: 1.0,
    decimals: 2,
};

const HUMIDITY: SensorSpec = SensorSpec {
    wire_key: "hum",
    entity_suffix: "humidity",
    unit: "%",
    icon: "mdi:water-percent",
    factor: 1.0,
    decimals: 2,
};

const TEMPERATURE: SensorSpec = SensorSpec {
    wire_key: "tmp",
    entity_suffix: "temperature",
    unit: "°C",
    icon: "mdi:temperature-celsius",
    factor: 1.0,
    decimals: 2,
};

// Power and current arrive in milli-units, voltage in decivolts.
const POWER: SensorSpec = SensorSpec {
    wire_key: "power",
    entity_suffix: "power",
    unit: "W",
    icon: "mdi:flash-outline",
    factor: 0.001,
    decimals: 2,
};

const CURRENT: SensorSpec = SensorSpec {
    wire_key: "current",
    entity_suffix: "current",
    unit: "A",
    icon: "mdi:current-ac",
    factor: 0.001,
    decimals: 2,
};

const VOLTAGE: SensorSpec = SensorSpec {
    wire_key: "voltage",
    entity_suffix: "voltage",
    unit: "V",
    icon: "mdi:power-plug",
    factor: 0.1,
    decimals: 2,
};

impl SensorKind {
    pub fn spec(self) -> &'static SensorSpec {
        match self {
            Self::Battery => &BATTERY,
            Self::Humidity => &HUMIDITY,
            Self::Temperature => &TEMPERATURE,
            Self::Power => &POWER,
            Self::Current => &CURRENT,
            Self::Voltage => &VOLTAGE,
        }
    }

    pub fn wire_key(self) -> &'static str {
        self.spec().wire_key
    }

    pub fn from_wire_key(key: &str) -> Option<Self> {
        Self::iter().find(|kind| kind.wire_key() == key)
    }

    /// Scale a raw reading and format it with the kind's precision.
    pub fn format_value(self, raw: f64) -> String {
        let spec = self.spec();
        format!("{:.*}", spec.decimals, raw * spec.factor)
    }
}
