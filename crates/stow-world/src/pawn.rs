//! Physical state of an agent: where it stands, what it holds, and what it
//! has committed to unload.

use serde::{Deserialize, Serialize};
use stow_types::{AgentId, Cell, ItemId};

use crate::tracked::TrackedCarrySet;

/// An agent's body in the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pawn {
    /// Agent identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Current cell.
    pub position: Cell,
    /// Whether the agent can use its hands. Incapable agents can only drop.
    pub capable_of_manipulation: bool,
    /// Inventory stacks in insertion order.
    pub inventory: Vec<ItemId>,
    /// The single-slot carry container.
    pub carried: Option<ItemId>,
    /// Items picked up into inventory that must eventually be unloaded.
    pub hauled: TrackedCarrySet,
}

impl Pawn {
    /// Create a healthy pawn with empty containers.
    pub fn new(name: &str, position: Cell) -> Self {
        Self {
            id: AgentId::new(),
            name: name.to_owned(),
            position,
            capable_of_manipulation: true,
            inventory: Vec::new(),
            carried: None,
            hauled: TrackedCarrySet::new(),
        }
    }

    /// Whether the handle is one of this pawn's inventory stacks.
    pub fn inventory_contains(&self, item: ItemId) -> bool {
        self.inventory.contains(&item)
    }
}
