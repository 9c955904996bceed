// ── Central snapshot store ──
//
// Devices and statuses live behind `ArcSwap` so readers always see a whole
// map from a single poll. Writers replace the map; the relay patch uses
// `rcu` so a concurrent poll is never lost. The two poll writers share a
// lock: each reads one map while replacing the other.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::{Device, DeviceStatus, DiscoveredEntity, EntityKey};

/// Devices keyed by cloud id.
pub type DeviceMap = BTreeMap<String, Arc<Device>>;
/// Latest status keyed by device id.
pub type StatusMap = BTreeMap<String, Arc<DeviceStatus>>;

pub struct DataStore {
    pub(crate) devices: ArcSwap<DeviceMap>,
    pub(crate) statuses: ArcSwap<StatusMap>,
    pub(crate) last_device_refresh: watch::Sender<Option<DateTime<Utc>>>,
    pub(crate) last_status_refresh: watch::Sender<Option<DateTime<Utc>>>,
    pub(crate) writer: Mutex<()>,
}

impl DataStore {
    pub fn new() -> Self {
        let (last_device_refresh, _) = watch::channel(None);
        let (last_status_refresh, _) = watch::channel(None);

        Self {
            devices: ArcSwap::from_pointee(DeviceMap::new()),
            statuses: ArcSwap::from_pointee(StatusMap::new()),
            last_device_refresh,
            last_status_refresh,
            writer: Mutex::new(()),
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn devices_snapshot(&self) -> Arc<DeviceMap> {
        self.devices.load_full()
    }

    pub fn statuses_snapshot(&self) -> Arc<StatusMap> {
        self.statuses.load_full()
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn device(&self, id: &str) -> Option<Arc<Device>> {
        self.devices.load().get(id).cloned()
    }

    pub fn status(&self, id: &str) -> Option<Arc<DeviceStatus>> {
        self.statuses.load().get(id).cloned()
    }

    // ── Counts ───────────────────────────────────────────────────────

    pub fn device_count(&self) -> usize {
        self.devices.load().len()
    }

    pub fn status_count(&self) -> usize {
        self.statuses.load().len()
    }

    // ── Refresh timestamps ───────────────────────────────────────────

    pub fn last_device_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_device_refresh.borrow()
    }

    pub fn last_status_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_status_refresh.borrow()
    }

    // ── Discovery candidates ─────────────────────────────────────────

    /// Every entity the current snapshots could back.
    ///
    /// Relay channels come from the status when one is known and from the
    /// device list's channel count otherwise. Sensors only come from status.
    pub fn entity_candidates(&self) -> Vec<DiscoveredEntity> {
        let devices = self.devices.load();
        let statuses = self.statuses.load();
        let mut out = Vec::new();

        for (id, device) in devices.iter() {
            let status = statuses.get(id);
            let relay_count = status
                .and_then(|s| u32::try_from(s.relays.len()).ok())
                .filter(|n| *n > 0)
                .unwrap_or(device.channels_count);

            for channel in 0..relay_count {
                out.push(DiscoveredEntity {
                    key: EntityKey::channel(id.clone(), channel),
                    device_name: device.name.clone(),
                    relay_count,
                });
            }

            if let Some(status) = status {
                out.extend(status.sensors.keys().map(|kind| DiscoveredEntity {
                    key: EntityKey::sensor(id.clone(), *kind),
                    device_name: device.name.clone(),
                    relay_count,
                }));
            }
        }

        out
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
