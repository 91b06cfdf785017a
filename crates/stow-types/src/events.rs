//! Journal records emitted by the unload activity.
//!
//! Every side effect the activity has on the shared world (reservations,
//! transfers, placements, drops) is recorded as an [`UnloadEvent`]. The
//! journal is what tests assert on and what the engine dumps at shutdown.

use serde::{Deserialize, Serialize};

use crate::enums::JobOutcome;
use crate::ids::{ActivityId, AgentId, ItemId};
use crate::structs::Cell;

/// A single observable step of an unload activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnloadEvent {
    /// A target and destination were chosen.
    TargetSelected {
        /// The item chosen for this cycle.
        item: ItemId,
        /// Def name of the item.
        def_name: String,
        /// Units that will be moved.
        count: u32,
        /// Destination cell.
        destination: Cell,
    },
    /// A stale tracked reference was replaced by a same-def inventory item.
    StragglerSubstituted {
        /// The stale tracked handle.
        stale: ItemId,
        /// The inventory item used in its place.
        straggler: ItemId,
    },
    /// A stale tracked reference was dropped with no replacement.
    StaleEntryRemoved {
        /// The stale tracked handle.
        stale: ItemId,
    },
    /// The destination cell was reserved.
    Reserved {
        /// The reserved cell.
        cell: Cell,
    },
    /// A reservation was released.
    Released {
        /// The released cell.
        cell: Cell,
    },
    /// Units moved from the inventory into the carry slot.
    Transferred {
        /// Inventory item the units came from.
        from: ItemId,
        /// Item now in the carry slot.
        carried: ItemId,
        /// Units moved.
        count: u32,
    },
    /// Units placed into storage.
    Placed {
        /// The placed (or absorbing) item.
        item: ItemId,
        /// Cell the units landed in.
        cell: Cell,
        /// Units placed there.
        count: u32,
    },
    /// Units dropped on the ground near the agent outside of storage.
    Dropped {
        /// The dropped (or absorbing) item.
        item: ItemId,
        /// Cell the units landed in.
        cell: Cell,
        /// Units dropped.
        count: u32,
    },
    /// The targeted item vanished or left the inventory before transfer.
    TargetLost {
        /// The lost handle.
        item: ItemId,
    },
    /// The activity reached a terminal state.
    Finished {
        /// How it ended.
        outcome: JobOutcome,
    },
}

/// An [`UnloadEvent`] stamped with who produced it and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnloadRecord {
    /// Scheduler tick on which the event happened.
    pub tick: u64,
    /// The unloading agent.
    pub agent: AgentId,
    /// The activity that produced the event.
    pub activity: ActivityId,
    /// The event itself.
    pub event: UnloadEvent,
}
