//! The per-agent set of items picked up into inventory that still have to
//! be unloaded.
//!
//! Entries remember the def name observed when they were tracked. A handle
//! can go stale (its stack was merged into another one), and the def name is
//! what lets the unload logic find a same-def replacement in the inventory.
//! The set never repairs itself; repair happens lazily when the unloader
//! reconciles it against the physical inventory.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stow_types::ItemId;

/// Tracked handles with the def name each had at insertion time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedCarrySet {
    entries: BTreeMap<ItemId, String>,
}

impl TrackedCarrySet {
    /// Create an empty set.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Start tracking a handle. Returns `false` if it was already tracked.
    pub fn track(&mut self, item: ItemId, def_name: &str) -> bool {
        if self.entries.contains_key(&item) {
            return false;
        }
        self.entries.insert(item, def_name.to_owned());
        true
    }

    /// Stop tracking a handle. Returns `false` if it was not tracked.
    pub fn remove(&mut self, item: ItemId) -> bool {
        self.entries.remove(&item).is_some()
    }

    /// Whether the handle is tracked.
    pub fn contains(&self, item: ItemId) -> bool {
        self.entries.contains_key(&item)
    }

    /// Def name recorded for a tracked handle.
    pub fn def_name(&self, item: ItemId) -> Option<&str> {
        self.entries.get(&item).map(String::as_str)
    }

    /// Number of tracked handles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(handle, def name)` pairs in handle order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &str)> {
        self.entries.iter().map(|(id, def)| (*id, def.as_str()))
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_is_unique_per_handle() {
        let mut set = TrackedCarrySet::new();
        let id = ItemId::from_parts(1, 0);
        assert!(set.track(id, "Steel"));
        assert!(!set.track(id, "Steel"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.def_name(id), Some("Steel"));
    }

    #[test]
    fn remove_reports_presence() {
        let mut set = TrackedCarrySet::new();
        let id = ItemId::from_parts(1, 0);
        assert!(!set.remove(id));
        set.track(id, "Wood");
        assert!(set.remove(id));
        assert!(set.is_empty());
    }

    #[test]
    fn same_slot_different_generation_are_distinct() {
        let mut set = TrackedCarrySet::new();
        set.track(ItemId::from_parts(2, 0), "Wood");
        set.track(ItemId::from_parts(2, 1), "Wood");
        assert_eq!(set.len(), 2);
    }
}
