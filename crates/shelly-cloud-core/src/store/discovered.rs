// ── Discovered entity set ──

use dashmap::DashSet;

use crate::model::EntityKey;

/// Keys already announced to hosts. Grows monotonically.
#[derive(Debug, Default)]
pub struct DiscoveredEntitySet {
    keys: DashSet<EntityKey>,
}

impl DiscoveredEntitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key`. Returns `true` only the first time a key is seen.
    pub fn insert(&self, key: EntityKey) -> bool {
        self.keys.insert(key)
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
