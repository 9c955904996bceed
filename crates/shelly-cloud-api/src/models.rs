// Shelly Cloud response types
//
// Every endpoint wraps its payload in the `CloudResponse<T>` envelope.
// Device and status objects carry many model-specific fields; the ones the
// bridge needs are modelled explicitly and the rest land in `extra`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Response Envelope ────────────────────────────────────────────────

/// Standard Shelly Cloud response envelope.
///
/// ```json
/// { "isok": true, "data": { ... } }
/// { "isok": false, "errors": { "title": "message" } }
/// ```
#[derive(Debug, Deserialize)]
pub struct CloudResponse<T> {
    pub isok: bool,
    pub data: Option<T>,
    pub errors: Option<IndexMap<String, Value>>,
}

// ── Auth ─────────────────────────────────────────────────────────────

/// `data` payload of `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub token: String,
    pub user_api_url: String,
    #[serde(default)]
    pub notifications_urls: Vec<String>,
}

// ── Devices ──────────────────────────────────────────────────────────

/// `data` payload of `POST /interface/device/list`.
#[derive(Debug, Deserialize)]
pub struct DeviceListData {
    #[serde(default)]
    pub devices: IndexMap<String, RawDevice>,
}

/// One entry of the device list, keyed by cloud id on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDevice {
    /// Filled from the map key when the object itself omits it.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub channels_count: Option<u32>,
    #[serde(default, rename = "type")]
    pub device_type: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Catch-all for model-specific fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

// ── Status ───────────────────────────────────────────────────────────

/// `data` payload of `GET /device/all_status`.
#[derive(Debug, Deserialize)]
pub struct AllStatusData {
    #[serde(default)]
    pub devices_status: IndexMap<String, RawDeviceStatus>,
}

/// Status object of a single device.
///
/// Sensor readings (`bat`, `hum`, `tmp`, `power`, ...) are top-level
/// objects with a numeric `value`; they are looked up from `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDeviceStatus {
    #[serde(default)]
    pub cloud: Option<RawCloudState>,
    #[serde(default)]
    pub relays: Vec<RawRelay>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl RawDeviceStatus {
    /// The numeric `value` of a sensor object such as `"tmp": {"value": 21.5}`.
    pub fn reading(&self, key: &str) -> Option<f64> {
        self.extra.get(key)?.get("value")?.as_f64()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RawCloudState {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRelay {
    #[serde(default)]
    pub ison: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}
