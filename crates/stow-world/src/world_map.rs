//! The world: a bounded grid of cells, the item arena, storage zones, and
//! the pawns standing in it.
//!
//! Every live item has exactly one [`Whereabouts`] and is listed in exactly
//! one container: a pawn's inventory, a pawn's carry slot, or the ground
//! stack of one cell. All mutations go through methods that keep the
//! container lists and the item's whereabouts in agreement.
//!
//! Containers merge stacks. Adding an item to an inventory that already
//! holds a same-def stack with room moves units into that stack, and an
//! incoming stack that is fully absorbed is destroyed. Handles to destroyed
//! items go stale (see [`ItemArena`]).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stow_types::{AgentId, Cell, ItemDef, ItemId, StoragePriority, Whereabouts};
use tracing::debug;

use crate::arena::{Item, ItemArena};
use crate::defs::DefRegistry;
use crate::error::WorldError;
use crate::pawn::Pawn;
use crate::storage::{StorageIndex, ZoneId};

/// The complete physical state of one map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldMap {
    /// Number of columns.
    width: i32,
    /// Number of rows.
    height: i32,
    /// Registered item defs.
    defs: DefRegistry,
    /// Every live item.
    items: ItemArena,
    /// Ground stacks, at most one per cell.
    ground: BTreeMap<Cell, ItemId>,
    /// Storage zones.
    storage: StorageIndex,
    /// Pawns by agent id.
    pawns: BTreeMap<AgentId, Pawn>,
}

impl WorldMap {
    /// Create an empty map of the given size.
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            defs: DefRegistry::new(),
            items: ItemArena::new(),
            ground: BTreeMap::new(),
            storage: StorageIndex::new(),
            pawns: BTreeMap::new(),
        }
    }

    // -------------------------------------------------------------------
    // Grid
    // -------------------------------------------------------------------

    /// Number of columns.
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows.
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Whether a cell lies on the map.
    pub const fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }

    // -------------------------------------------------------------------
    // Defs and storage
    // -------------------------------------------------------------------

    /// Register an item def.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateDef`] if the name is taken.
    pub fn register_def(&mut self, def: ItemDef) -> Result<(), WorldError> {
        self.defs.register(def)
    }

    /// The def registry.
    pub const fn defs(&self) -> &DefRegistry {
        &self.defs
    }

    /// Add a storage zone. Out-of-bounds cells are ignored.
    pub fn add_zone(
        &mut self,
        name: &str,
        priority: StoragePriority,
        accepts: &[&str],
        cells: impl IntoIterator<Item = Cell>,
    ) -> ZoneId {
        let (width, height) = (self.width, self.height);
        let cells: Vec<Cell> = cells
            .into_iter()
            .filter(|c| c.x >= 0 && c.y >= 0 && c.x < width && c.y < height)
            .collect();
        self.storage.add_zone(name, priority, accepts, cells)
    }

    /// The storage index.
    pub const fn storage(&self) -> &StorageIndex {
        &self.storage
    }

    /// Every storage cell that is valid for `def`, with its priority.
    pub fn storage_cells_for(&self, def: &ItemDef) -> Vec<(Cell, StoragePriority)> {
        self.storage
            .zones()
            .filter(|z| z.allows(def))
            .flat_map(|z| z.cells.iter().map(move |c| (*c, z.priority)))
            .collect()
    }

    /// Units of `def` that could still be put into `cell`.
    ///
    /// An empty cell takes a full stack; a cell holding a same-def stack
    /// takes what is left below the stack limit; anything else takes zero.
    pub fn room_for(&self, cell: Cell, def: &ItemDef) -> u32 {
        if !self.in_bounds(cell) {
            return 0;
        }
        match self.ground.get(&cell).and_then(|id| self.items.get(*id)) {
            None => def.stack_limit,
            Some(item) if item.def_name == def.def_name => {
                def.stack_limit.saturating_sub(item.stack_count)
            }
            Some(_) => 0,
        }
    }

    // -------------------------------------------------------------------
    // Pawns
    // -------------------------------------------------------------------

    /// Add a pawn and return its id.
    pub fn add_pawn(&mut self, pawn: Pawn) -> AgentId {
        let id = pawn.id;
        self.pawns.insert(id, pawn);
        id
    }

    /// Look up a pawn.
    pub fn pawn(&self, id: AgentId) -> Option<&Pawn> {
        self.pawns.get(&id)
    }

    /// Look up a pawn mutably.
    pub fn pawn_mut(&mut self, id: AgentId) -> Option<&mut Pawn> {
        self.pawns.get_mut(&id)
    }

    /// Look up a pawn, failing with [`WorldError::AgentNotFound`].
    pub fn require_pawn(&self, id: AgentId) -> Result<&Pawn, WorldError> {
        self.pawns.get(&id).ok_or(WorldError::AgentNotFound(id))
    }

    fn require_pawn_mut(&mut self, id: AgentId) -> Result<&mut Pawn, WorldError> {
        self.pawns.get_mut(&id).ok_or(WorldError::AgentNotFound(id))
    }

    /// Iterate over pawns in id order.
    pub fn pawns(&self) -> impl Iterator<Item = &Pawn> {
        self.pawns.values()
    }

    // -------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------

    /// Look up a live item.
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    /// Look up a live item, failing with [`WorldError::ItemNotFound`].
    pub fn require_item(&self, id: ItemId) -> Result<&Item, WorldError> {
        self.items.get(id).ok_or(WorldError::ItemNotFound(id))
    }

    /// Whether a handle refers to a live item.
    pub fn is_alive(&self, id: ItemId) -> bool {
        self.items.is_alive(id)
    }

    /// The def of a live item.
    pub fn item_def(&self, id: ItemId) -> Option<&ItemDef> {
        self.items
            .get(id)
            .and_then(|item| self.defs.get(&item.def_name))
    }

    /// Iterate over every live item.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// The ground stack in a cell.
    pub fn ground_at(&self, cell: Cell) -> Option<&Item> {
        self.ground.get(&cell).and_then(|id| self.items.get(*id))
    }

    /// Total live units of a def across every container.
    pub fn total_units(&self, def_name: &str) -> u64 {
        self.items
            .iter()
            .filter(|i| i.def_name == def_name)
            .map(|i| u64::from(i.stack_count))
            .fold(0_u64, u64::saturating_add)
    }

    /// Set or clear an item's forbidden flag.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ItemNotFound`] for a dead handle.
    pub fn set_forbidden(&mut self, id: ItemId, forbidden: bool) -> Result<(), WorldError> {
        let item = self.items.get_mut(id).ok_or(WorldError::ItemNotFound(id))?;
        item.forbidden = forbidden;
        Ok(())
    }

    /// Create a stack on the ground, merging into a same-def stack already
    /// there. Returns the handle now holding the units.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownDef`], [`WorldError::OutOfBounds`], or
    /// [`WorldError::CellBlocked`] if the cell cannot take all `count` units.
    pub fn spawn_on_ground(
        &mut self,
        def_name: &str,
        count: u32,
        cell: Cell,
    ) -> Result<ItemId, WorldError> {
        let def = self.defs.require(def_name)?.clone();
        if !self.in_bounds(cell) {
            return Err(WorldError::OutOfBounds(cell));
        }
        if count == 0 {
            return Err(WorldError::ZeroCount);
        }
        if self.room_for(cell, &def) < count {
            return Err(WorldError::CellBlocked {
                cell,
                def_name: def.def_name,
            });
        }
        if let Some(existing) = self.ground.get(&cell).copied() {
            self.add_units(existing, count)?;
            return Ok(existing);
        }
        let id = self.items.insert(def_name, count, Whereabouts::Ground(cell))?;
        self.ground.insert(cell, id);
        Ok(id)
    }

    /// Create a stack directly in a pawn's inventory (merging). Returns the
    /// handle now holding the last units added.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownDef`] or [`WorldError::AgentNotFound`].
    pub fn spawn_in_inventory(
        &mut self,
        agent: AgentId,
        def_name: &str,
        count: u32,
    ) -> Result<ItemId, WorldError> {
        self.defs.require(def_name)?;
        self.require_pawn(agent)?;
        let id = self
            .items
            .insert(def_name, count, Whereabouts::Inventory(agent))?;
        self.merge_into_inventory(agent, id)
    }

    // -------------------------------------------------------------------
    // Inventory
    // -------------------------------------------------------------------

    /// Whether the handle is a live stack in the agent's inventory.
    pub fn inventory_contains(&self, agent: AgentId, item: ItemId) -> bool {
        self.items.is_alive(item)
            && self
                .pawns
                .get(&agent)
                .is_some_and(|p| p.inventory_contains(item))
    }

    /// The agent's inventory stacks in order. Empty for unknown agents.
    pub fn inventory_items(&self, agent: AgentId) -> &[ItemId] {
        self.pawns
            .get(&agent)
            .map(|p| p.inventory.as_slice())
            .unwrap_or_default()
    }

    /// Pick `count` units of a ground stack up into the agent's inventory and
    /// track them for unloading.
    ///
    /// The tracked handle is the one that left the ground. If the inventory
    /// already held a same-def stack with room, the picked-up units merge
    /// into it and the returned handle is already stale; that is expected
    /// and is repaired when the unloader reconciles the tracked set.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ItemNotFound`] if the item is not on the ground,
    /// [`WorldError::ZeroCount`] for a zero count, or
    /// [`WorldError::AgentNotFound`].
    pub fn pick_up_to_inventory(
        &mut self,
        agent: AgentId,
        item: ItemId,
        count: u32,
    ) -> Result<ItemId, WorldError> {
        self.require_pawn(agent)?;
        let source = self.require_item(item)?;
        if !matches!(source.whereabouts, Whereabouts::Ground(_)) {
            return Err(WorldError::ItemNotFound(item));
        }
        if count == 0 {
            return Err(WorldError::ZeroCount);
        }
        let stack = source.stack_count;
        let def_name = source.def_name.clone();
        let count = count.min(stack);

        let picked = if count == stack {
            self.detach(item)?;
            self.set_whereabouts(item, Whereabouts::Inventory(agent))?;
            item
        } else {
            self.split_off(item, count, Whereabouts::Inventory(agent))?
        };

        self.require_pawn_mut(agent)?.hauled.track(picked, &def_name);
        let holder = self.merge_into_inventory(agent, picked)?;
        debug!(%agent, %picked, %holder, count, def = %def_name, "picked up into inventory");
        Ok(picked)
    }

    /// Move `count` units of an inventory stack into the agent's carry slot
    /// and return the handle of the carried stack.
    ///
    /// Moving the whole stack keeps its handle; moving part of it splits off
    /// a new instance. `count` is clamped to the stack size.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NotInInventory`], [`WorldError::CarrySlotOccupied`],
    /// [`WorldError::ZeroCount`], or [`WorldError::AgentNotFound`].
    pub fn transfer_to_carry(
        &mut self,
        agent: AgentId,
        item: ItemId,
        count: u32,
    ) -> Result<ItemId, WorldError> {
        let pawn = self.require_pawn(agent)?;
        if let Some(held) = pawn.carried {
            return Err(WorldError::CarrySlotOccupied { agent, item: held });
        }
        if !self.inventory_contains(agent, item) {
            return Err(WorldError::NotInInventory { agent, item });
        }
        if count == 0 {
            return Err(WorldError::ZeroCount);
        }
        let stack = self.require_item(item)?.stack_count;
        let count = count.min(stack);

        let carried = if count == stack {
            self.detach(item)?;
            self.set_whereabouts(item, Whereabouts::Carried(agent))?;
            item
        } else {
            self.split_off(item, count, Whereabouts::Carried(agent))?
        };
        self.require_pawn_mut(agent)?.carried = Some(carried);
        Ok(carried)
    }

    // -------------------------------------------------------------------
    // Low-level container plumbing
    // -------------------------------------------------------------------

    /// Move an item (already detached, or freshly inserted with inventory
    /// whereabouts but not yet listed) into an inventory, merging into
    /// same-def stacks with room. Returns the handle holding the last units.
    pub(crate) fn merge_into_inventory(
        &mut self,
        agent: AgentId,
        incoming: ItemId,
    ) -> Result<ItemId, WorldError> {
        let incoming_item = self.require_item(incoming)?;
        let def = self.defs.require(&incoming_item.def_name)?.clone();
        let mut remaining = incoming_item.stack_count;
        let stacks = self.require_pawn(agent)?.inventory.clone();

        let mut last_absorber = None;
        for stack in stacks {
            if remaining == 0 {
                break;
            }
            if stack == incoming {
                continue;
            }
            let Some(existing) = self.items.get(stack) else {
                continue;
            };
            if existing.def_name != def.def_name {
                continue;
            }
            let room = def.stack_limit.saturating_sub(existing.stack_count);
            let moved = room.min(remaining);
            if moved == 0 {
                continue;
            }
            self.add_units(stack, moved)?;
            remaining = remaining
                .checked_sub(moved)
                .ok_or(WorldError::ArithmeticOverflow)?;
            last_absorber = Some(stack);
        }

        if remaining == 0 {
            // Fully absorbed: the incoming instance ceases to exist.
            self.detach(incoming)?;
            self.items.remove(incoming);
            return last_absorber.ok_or(WorldError::ItemNotFound(incoming));
        }

        let item = self
            .items
            .get_mut(incoming)
            .ok_or(WorldError::ItemNotFound(incoming))?;
        item.stack_count = remaining;
        item.whereabouts = Whereabouts::Inventory(agent);
        let pawn = self.require_pawn_mut(agent)?;
        if !pawn.inventory.contains(&incoming) {
            pawn.inventory.push(incoming);
        }
        Ok(incoming)
    }

    /// Remove an item from whatever container lists it. The item itself
    /// stays alive with stale whereabouts until the caller updates them.
    pub(crate) fn detach(&mut self, id: ItemId) -> Result<(), WorldError> {
        let whereabouts = self.require_item(id)?.whereabouts;
        match whereabouts {
            Whereabouts::Inventory(agent) => {
                if let Some(pawn) = self.pawns.get_mut(&agent) {
                    pawn.inventory.retain(|i| *i != id);
                }
            }
            Whereabouts::Carried(agent) => {
                if let Some(pawn) = self.pawns.get_mut(&agent) {
                    if pawn.carried == Some(id) {
                        pawn.carried = None;
                    }
                }
            }
            Whereabouts::Ground(cell) => {
                if self.ground.get(&cell) == Some(&id) {
                    self.ground.remove(&cell);
                }
            }
        }
        Ok(())
    }

    pub(crate) fn set_whereabouts(
        &mut self,
        id: ItemId,
        whereabouts: Whereabouts,
    ) -> Result<(), WorldError> {
        let item = self.items.get_mut(id).ok_or(WorldError::ItemNotFound(id))?;
        item.whereabouts = whereabouts;
        Ok(())
    }

    pub(crate) fn add_units(&mut self, id: ItemId, count: u32) -> Result<(), WorldError> {
        let item = self.items.get_mut(id).ok_or(WorldError::ItemNotFound(id))?;
        item.stack_count = item
            .stack_count
            .checked_add(count)
            .ok_or(WorldError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Remove `count` units from a stack, destroying it when it empties.
    pub(crate) fn take_units(&mut self, id: ItemId, count: u32) -> Result<(), WorldError> {
        let item = self.items.get_mut(id).ok_or(WorldError::ItemNotFound(id))?;
        item.stack_count = item
            .stack_count
            .checked_sub(count)
            .ok_or(WorldError::ArithmeticOverflow)?;
        if item.stack_count == 0 {
            self.detach(id)?;
            self.items.remove(id);
        }
        Ok(())
    }

    /// Split `count` units (fewer than the whole stack) off into a new
    /// instance with the given whereabouts. The caller lists the new
    /// instance in its container.
    pub(crate) fn split_off(
        &mut self,
        id: ItemId,
        count: u32,
        whereabouts: Whereabouts,
    ) -> Result<ItemId, WorldError> {
        let source = self.require_item(id)?;
        if count == 0 || count >= source.stack_count {
            return Err(WorldError::ArithmeticOverflow);
        }
        let def_name = source.def_name.clone();
        let forbidden = source.forbidden;
        self.take_units(id, count)?;
        let new_id = self.items.insert(&def_name, count, whereabouts)?;
        if let Some(item) = self.items.get_mut(new_id) {
            item.forbidden = forbidden;
        }
        Ok(new_id)
    }

    pub(crate) fn put_on_ground(&mut self, cell: Cell, id: ItemId) {
        self.ground.insert(cell, id);
    }

    pub(crate) fn ground_id(&self, cell: Cell) -> Option<ItemId> {
        self.ground.get(&cell).copied()
    }
}

impl Default for WorldMap {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stow_types::ThingCategory;

    use super::*;

    fn world() -> (WorldMap, AgentId) {
        let mut map = WorldMap::new(10, 10);
        map.register_def(ItemDef::new(
            "Steel",
            Some(ThingCategory::new(2, "ResourcesRaw")),
            75,
        ))
        .unwrap();
        map.register_def(ItemDef::new(
            "Berries",
            Some(ThingCategory::new(1, "Foods")),
            10,
        ))
        .unwrap();
        let agent = map.add_pawn(Pawn::new("Ada", Cell::new(5, 5)));
        (map, agent)
    }

    #[test]
    fn pick_up_whole_stack_keeps_handle() {
        let (mut map, agent) = world();
        let steel = map.spawn_on_ground("Steel", 20, Cell::new(1, 1)).unwrap();
        let picked = map.pick_up_to_inventory(agent, steel, 20).unwrap();
        assert_eq!(picked, steel);
        assert!(map.inventory_contains(agent, steel));
        assert!(map.ground_at(Cell::new(1, 1)).is_none());
        assert!(map.pawn(agent).unwrap().hauled.contains(steel));
    }

    #[test]
    fn partial_pick_up_splits() {
        let (mut map, agent) = world();
        let steel = map.spawn_on_ground("Steel", 20, Cell::new(1, 1)).unwrap();
        let picked = map.pick_up_to_inventory(agent, steel, 5).unwrap();
        assert_ne!(picked, steel);
        assert_eq!(map.item(steel).unwrap().stack_count, 15);
        assert_eq!(map.item(picked).unwrap().stack_count, 5);
        assert_eq!(map.total_units("Steel"), 20);
    }

    #[test]
    fn merging_pick_up_leaves_stale_tracked_handle() {
        let (mut map, agent) = world();
        let held = map.spawn_in_inventory(agent, "Steel", 10).unwrap();
        let steel = map.spawn_on_ground("Steel", 20, Cell::new(1, 1)).unwrap();
        let picked = map.pick_up_to_inventory(agent, steel, 20).unwrap();

        assert!(!map.is_alive(picked));
        assert!(map.pawn(agent).unwrap().hauled.contains(picked));
        assert_eq!(map.item(held).unwrap().stack_count, 30);
        assert_eq!(map.inventory_items(agent), &[held]);
    }

    #[test]
    fn merge_respects_stack_limit() {
        let (mut map, agent) = world();
        let first = map.spawn_in_inventory(agent, "Berries", 8).unwrap();
        let second = map.spawn_in_inventory(agent, "Berries", 5).unwrap();
        assert_ne!(first, second);
        assert_eq!(map.item(first).unwrap().stack_count, 10);
        assert_eq!(map.item(second).unwrap().stack_count, 3);
        assert_eq!(map.inventory_items(agent).len(), 2);
    }

    #[test]
    fn transfer_partial_splits_into_carry_slot() {
        let (mut map, agent) = world();
        let steel = map.spawn_in_inventory(agent, "Steel", 30).unwrap();
        let carried = map.transfer_to_carry(agent, steel, 12).unwrap();
        assert_ne!(carried, steel);
        assert_eq!(map.pawn(agent).unwrap().carried, Some(carried));
        assert_eq!(map.item(steel).unwrap().stack_count, 18);
        assert_eq!(
            map.item(carried).unwrap().whereabouts,
            Whereabouts::Carried(agent)
        );
    }

    #[test]
    fn transfer_requires_empty_carry_slot() {
        let (mut map, agent) = world();
        let steel = map.spawn_in_inventory(agent, "Steel", 30).unwrap();
        let berries = map.spawn_in_inventory(agent, "Berries", 3).unwrap();
        map.transfer_to_carry(agent, steel, 30).unwrap();
        assert!(matches!(
            map.transfer_to_carry(agent, berries, 3),
            Err(WorldError::CarrySlotOccupied { .. })
        ));
    }

    #[test]
    fn room_for_blocks_other_defs() {
        let (mut map, _) = world();
        let cell = Cell::new(2, 2);
        map.spawn_on_ground("Berries", 4, cell).unwrap();
        let berries = map.defs().get("Berries").cloned().unwrap();
        let steel = map.defs().get("Steel").cloned().unwrap();
        assert_eq!(map.room_for(cell, &berries), 6);
        assert_eq!(map.room_for(cell, &steel), 0);
        assert_eq!(map.room_for(Cell::new(-1, 0), &steel), 0);
    }
}
