//! Unload behavior for the Stow simulation.
//!
//! An agent that picked items up into its inventory while doing other work
//! later runs an [`UnloadJob`]: one item per cycle, it picks a tracked item,
//! finds and claims a storage cell, moves the item into its carry slot,
//! walks there, puts it down, and releases the claim.
//!
//! # Modules
//!
//! - [`capability`] -- Traits for destination search, reservations, movement, and hooks.
//! - [`config`] -- Configuration loading from `stow-config.yaml`.
//! - [`movement`] -- [`GridWalker`]: default movement.
//! - [`reconciler`] -- [`CarriedSurplusReconciler`]: tracked set vs. inventory.
//! - [`reservation`] -- [`ReservationBook`]: default reservation ledger.
//! - [`resolver`] -- [`StorageResolver`]: default destination search.
//! - [`scheduler`] -- [`Scheduler`]: advances every active job once per tick.
//! - [`unload`] -- [`UnloadJob`]: the unload state machine.

pub mod capability;
pub mod config;
pub mod movement;
pub mod reconciler;
pub mod reservation;
pub mod resolver;
pub mod scheduler;
pub mod unload;

pub use capability::{
    Capabilities, DestinationResolver, InventoryHooks, Movement, NoopHooks, ReservationError,
    ReservationLedger, TravelStatus,
};
pub use config::{ConfigError, SimulationConfig, UnloadConfig};
pub use movement::GridWalker;
pub use reconciler::{CarriedSurplusReconciler, ThingCount};
pub use reservation::ReservationBook;
pub use resolver::StorageResolver;
pub use scheduler::{Scheduler, SchedulerError, TickSummary};
pub use unload::{JobStatus, UnloadError, UnloadJob, UnloadState};
