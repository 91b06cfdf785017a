//! End-of-run report, printed as JSON when the engine stops.

use serde::Serialize;
use stow_core::Scheduler;
use stow_types::{AgentId, JobOutcome, Whereabouts};
use stow_world::WorldMap;

/// Outcome of one pawn's unload job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    /// The pawn.
    pub agent: AgentId,
    /// Display name.
    pub name: String,
    /// Final outcome, `None` if still running when the engine stopped.
    pub outcome: Option<JobOutcome>,
    /// Tracked entries left over.
    pub still_tracked: usize,
}

/// Where every unit in the world ended up.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Ticks run.
    pub ticks: u64,
    /// Journal records produced.
    pub records: usize,
    /// Units resting in valid storage.
    pub units_stored: u64,
    /// Units on the ground outside storage.
    pub units_loose: u64,
    /// Units still in an inventory or carry slot.
    pub units_held: u64,
    /// Per-pawn outcomes.
    pub jobs: Vec<JobReport>,
}

impl RunReport {
    /// Build the report from the final world and scheduler state.
    pub fn collect(world: &WorldMap, scheduler: &Scheduler) -> Self {
        let (mut units_stored, mut units_loose, mut units_held) = (0_u64, 0_u64, 0_u64);
        for item in world.items() {
            let count = u64::from(item.stack_count);
            let bucket = match item.whereabouts {
                Whereabouts::Ground(cell) => {
                    let stored = world
                        .defs()
                        .get(&item.def_name)
                        .and_then(|def| world.storage().priority_for(cell, def))
                        .is_some();
                    if stored { &mut units_stored } else { &mut units_loose }
                }
                Whereabouts::Inventory(_) | Whereabouts::Carried(_) => &mut units_held,
            };
            *bucket = bucket.saturating_add(count);
        }

        let jobs = world
            .pawns()
            .map(|pawn| JobReport {
                agent: pawn.id,
                name: pawn.name.clone(),
                outcome: scheduler.outcome(pawn.id),
                still_tracked: pawn.hauled.len(),
            })
            .collect();

        Self {
            ticks: scheduler.current_tick(),
            records: scheduler.journal().len(),
            units_stored,
            units_loose,
            units_held,
            jobs,
        }
    }

    /// Jobs that ended in success.
    pub fn succeeded(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| j.outcome.is_some_and(JobOutcome::is_success))
            .count()
    }
}
