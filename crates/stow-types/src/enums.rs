//! Enumeration types shared across the Stow workspace.

use serde::{Deserialize, Serialize};

use crate::ids::AgentId;
use crate::structs::Cell;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Priority of a storage zone. Haulers prefer higher priorities.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum StoragePriority {
    /// Last-resort storage.
    Low,
    /// Default priority for new zones.
    #[default]
    Normal,
    /// Preferred over normal storage.
    Preferred,
    /// Preferred over everything but critical storage.
    Important,
    /// Always filled first.
    Critical,
}

// ---------------------------------------------------------------------------
// Item whereabouts
// ---------------------------------------------------------------------------

/// Where an item instance physically is.
///
/// Every live item has exactly one whereabouts; there is no "limbo" variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Whereabouts {
    /// Inside the agent's personal inventory.
    Inventory(AgentId),
    /// In the agent's single-slot carry container (held in hands).
    Carried(AgentId),
    /// Lying in a world cell.
    Ground(Cell),
}

// ---------------------------------------------------------------------------
// Activity outcome
// ---------------------------------------------------------------------------

/// Why an unload activity could not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncompletableReason {
    /// The destination cell could not be reserved.
    ReservationDenied,
    /// The movement system could not reach the destination.
    PathBlocked,
    /// A world operation failed mid-step.
    WorldFault,
}

/// Terminal outcome of an unload activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobOutcome {
    /// The activity ran to completion (including forced-drop endings).
    Succeeded,
    /// A precondition failed; the host reports it generically.
    Incompletable(IncompletableReason),
    /// The outer scheduler interrupted the activity.
    Cancelled,
}

impl JobOutcome {
    /// Whether this outcome counts as success to the caller.
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Succeeded)
    }
}
