//! Default destination selection: best storage priority, then nearest cell.

use core::cmp::Reverse;

use stow_types::{AgentId, Cell, ItemId, StoragePriority, Whereabouts};
use stow_world::WorldMap;
use tracing::trace;

use crate::capability::{DestinationResolver, ReservationLedger};

/// Picks the highest-priority storage cell with room, nearest to the agent.
///
/// A cell qualifies when its zone accepts the item's def, it can take at
/// least one unit, and no other agent has claimed it. If the item already
/// rests in storage, only strictly better zones qualify.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageResolver;

impl StorageResolver {
    /// Create a resolver.
    pub const fn new() -> Self {
        Self
    }
}

impl DestinationResolver for StorageResolver {
    fn find_cell(
        &self,
        world: &WorldMap,
        item: ItemId,
        agent: AgentId,
        reservations: &dyn ReservationLedger,
    ) -> Option<Cell> {
        let def = world.item_def(item)?;
        let origin = world.pawn(agent)?.position;
        let current = match world.item(item)?.whereabouts {
            Whereabouts::Ground(cell) => world.storage().priority_for(cell, def),
            Whereabouts::Inventory(_) | Whereabouts::Carried(_) => None,
        };

        let best = world
            .storage_cells_for(def)
            .into_iter()
            .filter(|(_, priority)| current.is_none_or(|cur: StoragePriority| *priority > cur))
            .filter(|(cell, _)| world.room_for(*cell, def) > 0)
            .filter(|(cell, _)| reservations.holder(*cell).is_none_or(|h| h == agent))
            .min_by_key(|(cell, priority)| (Reverse(*priority), cell.manhattan(origin), *cell))
            .map(|(cell, _)| cell);

        trace!(%agent, %item, destination = ?best, "resolved storage cell");
        best
    }
}
