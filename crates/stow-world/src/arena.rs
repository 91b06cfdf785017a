//! Generational arena holding every live item instance.
//!
//! Slots are reused after an item is destroyed, but each reuse bumps the
//! slot generation, so a handle minted before the destruction no longer
//! resolves. This is how stale references left behind by stack merges are
//! detected: lookups by a stale [`ItemId`] simply return `None`.

use serde::{Deserialize, Serialize};
use stow_types::{ItemId, Whereabouts};

use crate::error::WorldError;

/// A live item instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Handle of this instance.
    pub id: ItemId,
    /// Def name.
    pub def_name: String,
    /// Units in this stack (never zero for a live item).
    pub stack_count: u32,
    /// Forbidden items are ignored by automatic hauling.
    pub forbidden: bool,
    /// Where the item physically is.
    pub whereabouts: Whereabouts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    item: Option<Item>,
}

/// Arena of item instances addressed by generation-stamped handles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl ItemArena {
    /// Create an empty arena.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Insert a new instance and return its handle.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ZeroCount`] for an empty stack, or
    /// [`WorldError::ArithmeticOverflow`] if the arena exceeds `u32` slots.
    pub fn insert(
        &mut self,
        def_name: &str,
        stack_count: u32,
        whereabouts: Whereabouts,
    ) -> Result<ItemId, WorldError> {
        if stack_count == 0 {
            return Err(WorldError::ZeroCount);
        }

        let (index, generation) = if let Some(index) = self.free.pop() {
            let generation = self
                .slot(index)
                .map(|s| s.generation)
                .ok_or(WorldError::ArithmeticOverflow)?;
            (index, generation)
        } else {
            let index = u32::try_from(self.slots.len())
                .ok()
                .ok_or(WorldError::ArithmeticOverflow)?;
            self.slots.push(Slot::default());
            (index, 0)
        };

        let id = ItemId::from_parts(index, generation);
        let slot = self
            .slot_mut(index)
            .ok_or(WorldError::ArithmeticOverflow)?;
        slot.item = Some(Item {
            id,
            def_name: def_name.to_owned(),
            stack_count,
            forbidden: false,
            whereabouts,
        });
        Ok(id)
    }

    /// Look up a live item. Stale handles resolve to `None`.
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.slot(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.item.as_ref())
    }

    /// Look up a live item mutably. Stale handles resolve to `None`.
    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.slot_mut(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.item.as_mut())
    }

    /// Whether the handle refers to a live item.
    pub fn is_alive(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Destroy an item, invalidating every outstanding handle to it.
    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let slot = self
            .slot_mut(id.index)
            .filter(|s| s.generation == id.generation)?;
        let item = slot.item.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(item)
    }

    /// Iterate over all live items in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.slots.iter().filter_map(|s| s.item.as_ref())
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no items are alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, index: u32) -> Option<&Slot> {
        usize::try_from(index).ok().and_then(|i| self.slots.get(i))
    }

    fn slot_mut(&mut self, index: u32) -> Option<&mut Slot> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.slots.get_mut(i))
    }
}
