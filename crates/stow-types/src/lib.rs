//! Shared type definitions for the Stow unload simulation.
//!
//! This crate is the single source of truth for identifiers and value types
//! used across the workspace.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifiers, including the generation-stamped [`ItemId`]
//! - [`enums`] -- Storage priority, item whereabouts, activity outcomes
//! - [`structs`] -- Grid cells, categories, and item definitions
//! - [`events`] -- Journal records emitted by the unload activity

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{IncompletableReason, JobOutcome, StoragePriority, Whereabouts};
pub use events::{UnloadEvent, UnloadRecord};
pub use ids::{ActivityId, AgentId, ItemId};
pub use structs::{Cell, ItemDef, ThingCategory};

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_kind_tag() {
        let event = UnloadEvent::Reserved {
            cell: Cell::new(2, 3),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "reserved");
        assert_eq!(json["cell"]["x"], 2);
    }

    #[test]
    fn whereabouts_roundtrip() {
        let w = Whereabouts::Ground(Cell::new(-1, 4));
        let json = serde_json::to_string(&w).unwrap();
        let back: Whereabouts = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);
    }
}
