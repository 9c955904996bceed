// ── Snapshot store ──
//
// Lock-free device and status snapshots plus the set of entities already
// announced to hosts.

mod data_store;
mod discovered;
mod refresh;

pub use data_store::{DataStore, DeviceMap, StatusMap};
pub use discovered::DiscoveredEntitySet;
