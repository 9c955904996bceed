// ── Snapshot application logic ──
//
// Applies poll results to the DataStore. Both maps are replaced whole, so
// a device that vanishes from the list takes its status with it and a
// status for an unlisted device never lands.

use std::sync::{Arc, MutexGuard, PoisonError};

use chrono::Utc;

use super::data_store::{DeviceMap, StatusMap};
use super::DataStore;
use crate::model::{Device, DeviceStatus};

impl DataStore {
    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the device list and drop statuses of devices no longer listed.
    pub(crate) fn apply_devices(&self, devices: Vec<Device>) {
        let map: DeviceMap = devices
            .into_iter()
            .map(|d| (d.id.clone(), Arc::new(d)))
            .collect();

        let _writer = self.lock_writer();
        self.statuses.rcu(|current| {
            current
                .iter()
                .filter(|(id, _)| map.contains_key(*id))
                .map(|(id, status)| (id.clone(), Arc::clone(status)))
                .collect::<StatusMap>()
        });
        self.devices.store(Arc::new(map));

        self.last_device_refresh.send_replace(Some(Utc::now()));
    }

    /// Replace all statuses. Entries for unknown devices are dropped;
    /// returns how many were.
    pub(crate) fn apply_statuses(&self, statuses: Vec<DeviceStatus>) -> usize {
        let _writer = self.lock_writer();
        let devices = self.devices.load();
        let total = statuses.len();

        let map: StatusMap = statuses
            .into_iter()
            .filter(|s| devices.contains_key(&s.device_id))
            .map(|s| (s.device_id.clone(), Arc::new(s)))
            .collect();
        let dropped = total - map.len();

        self.statuses.store(Arc::new(map));
        self.last_status_refresh.send_replace(Some(Utc::now()));
        dropped
    }

    /// Overwrite one cached relay state in place.
    ///
    /// Returns `false` when the device has no status or no such channel;
    /// the cache is left untouched in that case.
    pub(crate) fn patch_relay(&self, device_id: &str, channel: u32, is_on: bool) -> bool {
        let mut patched = false;

        self.statuses.rcu(|current| {
            let mut next = StatusMap::clone(current);
            patched = match next.get_mut(device_id) {
                Some(entry) => Arc::make_mut(entry).set_relay(channel, is_on),
                None => false,
            };
            next
        });

        patched
    }
}
