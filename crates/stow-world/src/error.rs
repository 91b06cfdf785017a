//! Error types for the `stow-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use stow_types::{AgentId, Cell, ItemId};

/// Errors that can occur during world operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// No agent with this identifier exists.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// The handle does not refer to a live item (never existed or stale).
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// No def with this name is registered.
    #[error("unknown item def: {0}")]
    UnknownDef(String),

    /// A def with this name is already registered.
    #[error("duplicate item def: {0}")]
    DuplicateDef(String),

    /// The item is alive but not in the agent's inventory.
    #[error("item {item} is not in the inventory of agent {agent}")]
    NotInInventory {
        /// The agent whose inventory was searched.
        agent: AgentId,
        /// The item that was expected there.
        item: ItemId,
    },

    /// The agent already holds something in its carry slot.
    #[error("carry slot of agent {agent} already holds {item}")]
    CarrySlotOccupied {
        /// The agent.
        agent: AgentId,
        /// What the agent is already carrying.
        item: ItemId,
    },

    /// The agent's carry slot is empty.
    #[error("agent {0} is not carrying anything")]
    NothingCarried(AgentId),

    /// The cell lies outside the map.
    #[error("cell {0} is out of bounds")]
    OutOfBounds(Cell),

    /// The cell holds a stack that cannot absorb this item.
    #[error("cell {cell} cannot accept {def_name}")]
    CellBlocked {
        /// The blocked cell.
        cell: Cell,
        /// Def that was being placed.
        def_name: String,
    },

    /// No cell in range had room for the remaining units.
    ///
    /// The item keeps its previous whereabouts holding `leftover` units.
    #[error("no room to put down {leftover} units of {item}")]
    NoRoom {
        /// The item that could not be fully put down.
        item: ItemId,
        /// Units still held by the item.
        leftover: u32,
    },

    /// A stack count of zero was requested where at least one unit is needed.
    #[error("stack count must be non-zero")]
    ZeroCount,

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,
}
