//! Grid, items, containers, and storage for the Stow unload simulation.
//!
//! This crate models the physical world an unloading agent acts on: a
//! bounded grid of cells, a generational arena of item instances, agent
//! inventories and carry slots with stack-merging semantics, and storage
//! zones with priorities and category filters.
//!
//! # Modules
//!
//! - [`arena`] -- [`ItemArena`]: item instances behind generation-stamped handles.
//! - [`defs`] -- [`DefRegistry`] of item definitions.
//! - [`error`] -- Error types for world operations.
//! - [`pawn`] -- [`Pawn`]: an agent's position, containers, and tracked set.
//! - [`placement`] -- Dropping near an agent and placing into storage with fallback.
//! - [`storage`] -- Storage zones and the cell-to-zone index.
//! - [`tracked`] -- [`TrackedCarrySet`]: items still to be unloaded.
//! - [`world_map`] -- [`WorldMap`]: the map tying everything together.
//! - [`starting_world`] -- Default defs and zone layout for the demo scenario.

pub mod arena;
pub mod defs;
pub mod error;
pub mod pawn;
pub mod placement;
pub mod starting_world;
pub mod storage;
pub mod tracked;
pub mod world_map;

// Re-export primary types at crate root.
pub use arena::{Item, ItemArena};
pub use defs::DefRegistry;
pub use error::WorldError;
pub use pawn::Pawn;
pub use placement::{Landing, Placement};
pub use starting_world::{StartingZones, create_starting_world, starting_defs};
pub use storage::{StorageIndex, StorageZone, ZoneId};
pub use tracked::TrackedCarrySet;
pub use world_map::WorldMap;
