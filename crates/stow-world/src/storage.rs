//! Storage zones: groups of cells with a priority and a category filter.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use stow_types::{Cell, ItemDef, StoragePriority};

/// Identifier of a storage zone within one world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneId(pub u32);

impl core::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "zone#{}", self.0)
    }
}

/// A storage zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageZone {
    /// Zone identifier.
    pub id: ZoneId,
    /// Display name.
    pub name: String,
    /// Haulers fill higher-priority zones first.
    pub priority: StoragePriority,
    /// Accepted category names. Empty accepts every storable def.
    pub accepts: BTreeSet<String>,
    /// Cells belonging to the zone.
    pub cells: BTreeSet<Cell>,
}

impl StorageZone {
    /// Whether the zone's filter allows this def.
    ///
    /// Never-storable defs are rejected. Uncategorized defs only pass an
    /// empty (accept-all) filter.
    pub fn allows(&self, def: &ItemDef) -> bool {
        if !def.ever_storable {
            return false;
        }
        if self.accepts.is_empty() {
            return true;
        }
        def.category
            .as_ref()
            .is_some_and(|c| self.accepts.contains(&c.name))
    }
}

/// All storage zones of a world with a cell-to-zone index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageIndex {
    zones: BTreeMap<ZoneId, StorageZone>,
    by_cell: BTreeMap<Cell, ZoneId>,
    next_id: u32,
}

impl StorageIndex {
    /// Create an empty index.
    pub const fn new() -> Self {
        Self {
            zones: BTreeMap::new(),
            by_cell: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Add a zone. Cells already owned by another zone are skipped.
    pub fn add_zone(
        &mut self,
        name: &str,
        priority: StoragePriority,
        accepts: &[&str],
        cells: impl IntoIterator<Item = Cell>,
    ) -> ZoneId {
        let id = ZoneId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        let mut owned = BTreeSet::new();
        for cell in cells {
            if self.by_cell.contains_key(&cell) {
                continue;
            }
            self.by_cell.insert(cell, id);
            owned.insert(cell);
        }

        self.zones.insert(
            id,
            StorageZone {
                id,
                name: name.to_owned(),
                priority,
                accepts: accepts.iter().map(|s| (*s).to_owned()).collect(),
                cells: owned,
            },
        );
        id
    }

    /// The zone owning a cell, if any.
    pub fn zone_at(&self, cell: Cell) -> Option<&StorageZone> {
        self.by_cell.get(&cell).and_then(|id| self.zones.get(id))
    }

    /// Look up a zone.
    pub fn zone(&self, id: ZoneId) -> Option<&StorageZone> {
        self.zones.get(&id)
    }

    /// Iterate over zones in id order.
    pub fn zones(&self) -> impl Iterator<Item = &StorageZone> {
        self.zones.values()
    }

    /// Priority a def would get stored at in this cell, `None` if the cell
    /// is not valid storage for it.
    pub fn priority_for(&self, cell: Cell, def: &ItemDef) -> Option<StoragePriority> {
        self.zone_at(cell)
            .filter(|z| z.allows(def))
            .map(|z| z.priority)
    }
}

#[cfg(test)]
mod tests {
    use stow_types::ThingCategory;

    use super::*;

    fn steel() -> ItemDef {
        ItemDef::new("Steel", Some(ThingCategory::new(2, "ResourcesRaw")), 75)
    }

    #[test]
    fn empty_filter_accepts_storable() {
        let mut index = StorageIndex::new();
        index.add_zone("any", StoragePriority::Normal, &[], [Cell::new(0, 0)]);
        assert_eq!(
            index.priority_for(Cell::new(0, 0), &steel()),
            Some(StoragePriority::Normal)
        );
        assert_eq!(index.priority_for(Cell::new(0, 0), &steel().never_storable()), None);
    }

    #[test]
    fn filter_matches_category_name() {
        let mut index = StorageIndex::new();
        index.add_zone("food", StoragePriority::Important, &["Foods"], [Cell::new(1, 1)]);
        assert_eq!(index.priority_for(Cell::new(1, 1), &steel()), None);
        let uncategorized = ItemDef::new("Chunk", None, 1);
        assert_eq!(index.priority_for(Cell::new(1, 1), &uncategorized), None);
    }

    #[test]
    fn cells_belong_to_first_zone() {
        let mut index = StorageIndex::new();
        let a = index.add_zone("a", StoragePriority::Low, &[], [Cell::new(0, 0)]);
        let b = index.add_zone("b", StoragePriority::Critical, &[], [Cell::new(0, 0), Cell::new(0, 1)]);
        assert_eq!(index.zone_at(Cell::new(0, 0)).map(|z| z.id), Some(a));
        assert_eq!(index.zone(b).map(|z| z.cells.len()), Some(1));
    }
}
