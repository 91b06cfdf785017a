//! Default movement: straight-line grid walking at a fixed stride.
//!
//! The map has no obstacles, so the only way to be blocked is a destination
//! outside the grid. Agents walk along the x axis first, then y.

use stow_types::{AgentId, Cell};
use stow_world::WorldMap;
use tracing::trace;

use crate::capability::{Movement, TravelStatus};

/// Walks agents up to `stride` cells per tick.
#[derive(Debug, Clone, Copy)]
pub struct GridWalker {
    stride: u32,
}

impl GridWalker {
    /// Create a walker covering `stride` cells per tick (at least one).
    pub fn new(stride: u32) -> Self {
        Self {
            stride: stride.max(1),
        }
    }

    /// Cells covered per tick.
    pub const fn stride(&self) -> u32 {
        self.stride
    }
}

impl Default for GridWalker {
    fn default() -> Self {
        Self::new(1)
    }
}

/// One cell closer to `to`, x first.
const fn step_toward(from: Cell, to: Cell) -> Cell {
    if from.x != to.x {
        let dx = if to.x > from.x { 1 } else { -1 };
        Cell::new(from.x.saturating_add(dx), from.y)
    } else if from.y != to.y {
        let dy = if to.y > from.y { 1 } else { -1 };
        Cell::new(from.x, from.y.saturating_add(dy))
    } else {
        from
    }
}

impl Movement for GridWalker {
    fn advance(
        &mut self,
        world: &mut WorldMap,
        agent: AgentId,
        destination: Cell,
    ) -> TravelStatus {
        if !world.in_bounds(destination) {
            return TravelStatus::Blocked;
        }
        let Some(pawn) = world.pawn_mut(agent) else {
            return TravelStatus::Blocked;
        };

        for _ in 0..self.stride {
            if pawn.position == destination {
                break;
            }
            pawn.position = step_toward(pawn.position, destination);
        }
        trace!(%agent, position = %pawn.position, %destination, "walked");

        if pawn.position == destination {
            TravelStatus::Arrived
        } else {
            TravelStatus::EnRoute
        }
    }
}
