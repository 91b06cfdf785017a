//! Type-safe identifier wrappers.
//!
//! Agents and activities get strongly-typed UUID v7 identifiers to prevent
//! accidental mixing at compile time. Items are different: their identity
//! is a generation-stamped arena handle, because a stack merge destroys one
//! instance and an old handle must be detectable as stale rather than
//! silently pointing at whatever reuses the slot.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an agent (a pawn carrying an inventory).
    AgentId
}

define_id! {
    /// Unique identifier for one running activity (job) of an agent.
    ///
    /// Reservations are keyed by `(cell, agent, activity)` so that two
    /// activities of the same agent never share a claim.
    ActivityId
}

/// Generation-stamped handle to an item instance in the world arena.
///
/// `index` names an arena slot; `generation` is bumped every time the slot
/// is vacated. A handle whose generation no longer matches its slot refers
/// to an instance that has been destroyed (typically absorbed by a stack
/// merge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId {
    /// Arena slot index.
    pub index: u32,
    /// Slot generation at the time this handle was minted.
    pub generation: u32,
}

impl ItemId {
    /// Build a handle from its raw parts.
    pub const fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "item#{}v{}", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let agent = AgentId::new();
        let activity = ActivityId::new();
        assert_ne!(agent.into_inner(), Uuid::nil());
        assert_ne!(activity.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = AgentId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }

    #[test]
    fn item_handles_differ_by_generation() {
        let old = ItemId::from_parts(3, 0);
        let new = ItemId::from_parts(3, 1);
        assert_ne!(old, new);
        assert_eq!(new.to_string(), "item#3v1");
    }
}
