//! In-memory reservation book.
//!
//! One claim per cell. A claim belongs to an `(agent, activity)` pair so a
//! restarted activity for the same agent cannot release a predecessor's
//! claims by accident.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stow_types::{ActivityId, AgentId, Cell};
use tracing::trace;

use crate::capability::{ReservationError, ReservationLedger};

/// A single claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Claiming agent.
    pub agent: AgentId,
    /// Claiming activity.
    pub activity: ActivityId,
}

/// Default [`ReservationLedger`] backed by an ordered map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReservationBook {
    claims: BTreeMap<Cell, Claim>,
}

impl ReservationBook {
    /// Create an empty book.
    pub const fn new() -> Self {
        Self {
            claims: BTreeMap::new(),
        }
    }

    /// Number of live claims.
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether no claims are held.
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// The claim on `cell`, if any.
    pub fn claim(&self, cell: Cell) -> Option<Claim> {
        self.claims.get(&cell).copied()
    }
}

impl ReservationLedger for ReservationBook {
    fn reserve(
        &mut self,
        cell: Cell,
        agent: AgentId,
        activity: ActivityId,
    ) -> Result<(), ReservationError> {
        match self.claims.get(&cell) {
            Some(claim) if claim.agent == agent && claim.activity == activity => Ok(()),
            Some(claim) => Err(ReservationError::Denied {
                cell,
                holder: claim.agent,
            }),
            None => {
                self.claims.insert(cell, Claim { agent, activity });
                trace!(%cell, %agent, "reserved");
                Ok(())
            }
        }
    }

    fn release(&mut self, cell: Cell, agent: AgentId, activity: ActivityId) {
        if self.is_reserved_by(cell, agent, activity) {
            self.claims.remove(&cell);
            trace!(%cell, %agent, "released");
        }
    }

    fn is_reserved_by(&self, cell: Cell, agent: AgentId, activity: ActivityId) -> bool {
        self.claims
            .get(&cell)
            .is_some_and(|c| c.agent == agent && c.activity == activity)
    }

    fn holder(&self, cell: Cell) -> Option<AgentId> {
        self.claims.get(&cell).map(|c| c.agent)
    }

    fn release_all(&mut self, agent: AgentId, activity: ActivityId) {
        self.claims
            .retain(|_, c| !(c.agent == agent && c.activity == activity));
    }
}
