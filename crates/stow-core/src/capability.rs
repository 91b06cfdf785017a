//! Host capabilities the unload activity depends on.
//!
//! The activity never decides where things go, who owns a cell, or how an
//! agent walks. Those are injected through the traits below so the state
//! machine can be driven by the default implementations in this crate, by
//! test doubles, or by a richer host.
//!
//! - [`DestinationResolver`] -- picks a storage cell for an item.
//! - [`ReservationLedger`] -- exclusive claims on destination cells.
//! - [`Movement`] -- advances an agent toward a cell, one tick at a time.
//! - [`InventoryHooks`] -- extension callbacks after inventory changes.

use serde::{Deserialize, Serialize};
use stow_types::{ActivityId, AgentId, Cell, ItemId};
use stow_world::WorldMap;

/// Errors returned by a [`ReservationLedger`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReservationError {
    /// Another claimant already holds the cell.
    #[error("cell {cell} is reserved by agent {holder}")]
    Denied {
        /// The contested cell.
        cell: Cell,
        /// The agent currently holding it.
        holder: AgentId,
    },
}

/// Chooses where an item should be stored.
pub trait DestinationResolver {
    /// Find a storage cell for `item` on behalf of `agent`.
    ///
    /// Returns `None` when no valid storage exists. Cells claimed by other
    /// agents in `reservations` must not be returned.
    fn find_cell(
        &self,
        world: &WorldMap,
        item: ItemId,
        agent: AgentId,
        reservations: &dyn ReservationLedger,
    ) -> Option<Cell>;
}

/// Exclusive claims on destination cells, keyed by agent and activity.
pub trait ReservationLedger {
    /// Claim `cell` for the activity. Re-reserving an own claim succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::Denied`] if another claimant holds it.
    fn reserve(
        &mut self,
        cell: Cell,
        agent: AgentId,
        activity: ActivityId,
    ) -> Result<(), ReservationError>;

    /// Release the activity's claim on `cell`. No-op if it holds none.
    fn release(&mut self, cell: Cell, agent: AgentId, activity: ActivityId);

    /// Whether the activity holds a claim on `cell`.
    fn is_reserved_by(&self, cell: Cell, agent: AgentId, activity: ActivityId) -> bool;

    /// The agent holding `cell`, if any.
    fn holder(&self, cell: Cell) -> Option<AgentId>;

    /// Release every claim the activity holds.
    fn release_all(&mut self, agent: AgentId, activity: ActivityId);
}

/// Progress reported by [`Movement::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelStatus {
    /// The agent stands on the destination.
    Arrived,
    /// The agent moved (or waited) and is still on its way.
    EnRoute,
    /// The destination cannot be reached.
    Blocked,
}

/// Moves agents across the map.
pub trait Movement {
    /// Advance `agent` toward `destination` by one tick's worth of travel.
    fn advance(&mut self, world: &mut WorldMap, agent: AgentId, destination: Cell)
    -> TravelStatus;
}

/// Callbacks for extensions that track agent inventories.
pub trait InventoryHooks {
    /// The agent's inventory changed and derived loadout state is stale.
    fn recompute_inventory(&mut self, world: &WorldMap, agent: AgentId);
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl InventoryHooks for NoopHooks {
    fn recompute_inventory(&mut self, _world: &WorldMap, _agent: AgentId) {}
}

/// Borrowed bundle of every capability, handed to the activity each tick.
pub struct Capabilities<'a> {
    /// Storage cell selection.
    pub resolver: &'a dyn DestinationResolver,
    /// Cell claims.
    pub reservations: &'a mut dyn ReservationLedger,
    /// Agent travel.
    pub movement: &'a mut dyn Movement,
    /// Inventory extension callbacks.
    pub hooks: &'a mut dyn InventoryHooks,
}

impl core::fmt::Debug for Capabilities<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Capabilities").finish_non_exhaustive()
    }
}
