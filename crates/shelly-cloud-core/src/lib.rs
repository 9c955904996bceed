//! Polling bridge between Shelly Cloud and a home-automation host.
//!
//! - [`Bridge`] logs in, polls device status and the device list on
//!   separate timers, and serves lock-free snapshots to readers.
//! - New relay channels and sensor readings are announced once each on a
//!   broadcast channel ([`Bridge::subscribe_discoveries`]).
//! - [`entity`] turns announcements into switch and sensor entities.

pub mod bridge;
pub mod config;
pub mod convert;
pub mod entity;
pub mod error;
pub mod model;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::{Bridge, BridgeState};
pub use config::{BridgeConfig, Credentials, TlsVerification, WritePolicy};
pub use entity::{Entity, SensorEntity, ShellyEntity, SwitchEntity, build_entity};
pub use error::CoreError;
pub use store::DataStore;

pub use shelly_cloud_api::Turn;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    CloudState, Device, DeviceStatus, DiscoveredEntity, EntityKey, EntityKind, RelayState,
    SensorKind, SensorReading, SensorSpec,
};
