// ── Device domain type ──

use serde::{Deserialize, Serialize};

/// A device registered to the account, as reported by the device list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Cloud-assigned id, stable across refreshes.
    pub id: String,
    /// User-facing name; falls back to the id when the cloud has none.
    pub name: String,
    /// Relay channel count as reported by the device list (0 if unknown).
    pub channels_count: u32,
    /// Model code, e.g. `SHPLG-S`.
    pub device_type: Option<String>,
    pub category: Option<String>,
}
