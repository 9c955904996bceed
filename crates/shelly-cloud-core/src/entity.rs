// ── Host-facing entities ──
//
// Thin views over the bridge's snapshots. An entity caches the state it
// read on its last `update`, so hosts can render without touching the
// bridge between polls.

use shelly_cloud_api::Turn;
use tracing::{error, info};

use crate::bridge::Bridge;
use crate::model::{DiscoveredEntity, EntityKind, SensorKind};

/// Prefix shared by every entity id.
pub const ENTITY_DOMAIN: &str = "shelly_cloud";

/// Common surface of switches and sensors.
pub trait Entity {
    /// Stable id, e.g. `switch.shelly_cloud_abc123_1`.
    fn entity_id(&self) -> &str;

    fn name(&self) -> &str;

    fn device_id(&self) -> &str;

    /// Pull the latest state from the bridge's snapshots.
    fn update(&mut self, bridge: &Bridge);

    fn is_available(&self) -> bool;

    /// Rendered state: `on`/`off` for switches, a fixed-precision number
    /// for sensors.
    fn display_state(&self) -> String;

    fn icon(&self) -> Option<&'static str> {
        None
    }

    fn unit_of_measurement(&self) -> Option<&'static str> {
        None
    }
}

// ── Switch ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SwitchEntity {
    entity_id: String,
    name: String,
    device_id: String,
    channel: u32,
    is_on: bool,
    available: bool,
}

impl SwitchEntity {
    /// The channel suffix only appears on devices with more than one relay.
    pub fn new(device_id: &str, device_name: &str, channel: u32, relay_count: u32) -> Self {
        let entity_id = if relay_count > 1 {
            format!("switch.{ENTITY_DOMAIN}_{device_id}_{channel}")
        } else {
            format!("switch.{ENTITY_DOMAIN}_{device_id}")
        };

        Self {
            entity_id,
            name: device_name.to_owned(),
            device_id: device_id.to_owned(),
            channel,
            is_on: false,
            available: false,
        }
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub async fn turn_on(&mut self, bridge: &Bridge) -> bool {
        self.switch(bridge, Turn::On).await
    }

    pub async fn turn_off(&mut self, bridge: &Bridge) -> bool {
        self.switch(bridge, Turn::Off).await
    }

    /// The requested state shows locally before the cloud answers; the
    /// following `update` settles it per the bridge's write policy.
    async fn switch(&mut self, bridge: &Bridge, turn: Turn) -> bool {
        self.is_on = turn.is_on();
        let accepted = bridge.set_channel(&self.device_id, self.channel, turn).await;
        self.update(bridge);
        accepted
    }
}

impl Entity for SwitchEntity {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn update(&mut self, bridge: &Bridge) {
        let is_on = bridge.switch_status(&self.device_id, self.channel);
        if is_on != self.is_on {
            info!(
                entity = %self.entity_id,
                from = self.is_on,
                to = is_on,
                "switch state changed"
            );
        }
        self.is_on = is_on;
        self.available = bridge.availability(&self.device_id);
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn display_state(&self) -> String {
        Turn::from(self.is_on).to_string()
    }

    fn icon(&self) -> Option<&'static str> {
        Some("mdi:toggle-switch")
    }
}

// ── Sensor ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SensorEntity {
    entity_id: String,
    name: String,
    device_id: String,
    kind: SensorKind,
    value: f64,
    available: bool,
}

impl SensorEntity {
    pub fn new(device_id: &str, device_name: &str, kind: SensorKind) -> Self {
        let suffix = kind.spec().entity_suffix;
        Self {
            entity_id: format!("sensor.{ENTITY_DOMAIN}_{device_id}_{suffix}"),
            name: format!("{device_name} {suffix}"),
            device_id: device_id.to_owned(),
            kind,
            value: 0.0,
            available: false,
        }
    }
}

impl Entity for SensorEntity {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn device_id(&self) -> &str {
        &self.device_id
    }

    /// A missing reading keeps the previous value.
    fn update(&mut self, bridge: &Bridge) {
        if let Some(value) = bridge.sensor_value(&self.device_id, self.kind) {
            self.value = value;
        }
        self.available = bridge.availability(&self.device_id);
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn display_state(&self) -> String {
        self.kind.format_value(self.value)
    }

    fn icon(&self) -> Option<&'static str> {
        Some(self.kind.spec().icon)
    }

    fn unit_of_measurement(&self) -> Option<&'static str> {
        Some(self.kind.spec().unit)
    }
}

// ── ShellyEntity ─────────────────────────────────────────────────

/// Either kind of entity, for hosts that keep them in one collection.
#[derive(Debug, Clone)]
pub enum ShellyEntity {
    Switch(SwitchEntity),
    Sensor(SensorEntity),
}

impl ShellyEntity {
    fn as_entity(&self) -> &dyn Entity {
        match self {
            Self::Switch(s) => s,
            Self::Sensor(s) => s,
        }
    }

    fn as_entity_mut(&mut self) -> &mut dyn Entity {
        match self {
            Self::Switch(s) => s,
            Self::Sensor(s) => s,
        }
    }
}

impl Entity for ShellyEntity {
    fn entity_id(&self) -> &str {
        self.as_entity().entity_id()
    }

    fn name(&self) -> &str {
        self.as_entity().name()
    }

    fn device_id(&self) -> &str {
        self.as_entity().device_id()
    }

    fn update(&mut self, bridge: &Bridge) {
        self.as_entity_mut().update(bridge);
    }

    fn is_available(&self) -> bool {
        self.as_entity().is_available()
    }

    fn display_state(&self) -> String {
        self.as_entity().display_state()
    }

    fn icon(&self) -> Option<&'static str> {
        self.as_entity().icon()
    }

    fn unit_of_measurement(&self) -> Option<&'static str> {
        self.as_entity().unit_of_measurement()
    }
}

/// Build the entity for a discovery announcement, primed with the current
/// snapshot. Returns `None` if the device is no longer known.
pub fn build_entity(bridge: &Bridge, discovered: &DiscoveredEntity) -> Option<ShellyEntity> {
    let device_id = discovered.key.device_id.as_str();
    if bridge.device(device_id).is_none() {
        error!(device = device_id, "device is not in the device list");
        return None;
    }

    let mut entity = match discovered.key.kind {
        EntityKind::Channel(channel) => ShellyEntity::Switch(SwitchEntity::new(
            device_id,
            &discovered.device_name,
            channel,
            discovered.relay_count,
        )),
        EntityKind::Sensor(kind) => {
            ShellyEntity::Sensor(SensorEntity::new(device_id, &discovered.device_name, kind))
        }
    };
    entity.update(bridge);
    Some(entity)
}
