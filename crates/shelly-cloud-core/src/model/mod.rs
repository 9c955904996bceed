// ── Domain model ──
//
// Canonical representation of Shelly Cloud devices, their last known
// status, and the entity keys the bridge surfaces to hosts.

pub mod device;
pub mod entity_key;
pub mod sensor;
pub mod status;

// ── Re-exports ──────────────────────────────────────────────────────

pub use device::Device;
pub use entity_key::{DiscoveredEntity, EntityKey, EntityKind};
pub use sensor::{SensorKind, SensorSpec};
pub use status::{CloudState, DeviceStatus, RelayState, SensorReading};
