//! The unload activity: moves every tracked inventory item into storage, one
//! item per cycle.
//!
//! ```text
//! Waiting -> FindingSpot -> Reserving -> Transferring -> Traveling
//!    ^                                                     |
//!    +------------- Releasing <------- Placing <-----------+
//! ```
//!
//! A tick runs instant states back to back until the job suspends (Waiting
//! with ticks left, Traveling en route) or finishes. Every way out of the
//! job, cancellation included, releases the job's claims and drops anything
//! still in the carry slot, so no item is left in limbo.

use serde::{Deserialize, Serialize};
use stow_types::{
    ActivityId, AgentId, Cell, IncompletableReason, ItemId, JobOutcome, UnloadEvent,
};
use stow_world::{Landing, WorldError, WorldMap};
use tracing::{debug, info, warn};

use crate::capability::{Capabilities, TravelStatus};
use crate::config::UnloadConfig;
use crate::reconciler::CarriedSurplusReconciler;

/// Upper bound on instant steps per tick. A cycle has seven states, so this
/// only trips when zero-delay cycles keep restarting.
const MAX_STEPS_PER_TICK: u32 = 64;

/// Sentinel for "no transfer in flight".
const NO_COUNT: i32 = -1;

const fn no_count() -> i32 {
    NO_COUNT
}

/// Errors raised by world operations inside a step.
///
/// These never escape [`UnloadJob::tick`]: the job logs them and ends
/// `Incompletable(WorldFault)` after cleanup.
#[derive(Debug, thiserror::Error)]
pub enum UnloadError {
    /// A world operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A state that needs a destination was entered without one.
    #[error("no destination selected in state {state:?}")]
    MissingDestination {
        /// The state being run.
        state: UnloadState,
    },
}

/// Where the job is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnloadState {
    /// Pausing before the next selection.
    Waiting,
    /// Choosing the next item and its destination.
    FindingSpot,
    /// Claiming the destination cell.
    Reserving,
    /// Moving units from the inventory into the carry slot.
    Transferring,
    /// Walking to the destination.
    Traveling,
    /// Putting the carried stack down.
    Placing,
    /// Releasing the destination claim.
    Releasing,
    /// Done.
    Finished(JobOutcome),
}

/// What a tick left the job in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// The job suspended and wants more ticks.
    Running,
    /// The job reached a terminal state.
    Finished(JobOutcome),
}

/// Whether the tick loop may run the next state right away.
enum Flow {
    Continue,
    Suspend,
}

/// A single agent's unload activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnloadJob {
    agent: AgentId,
    activity: ActivityId,
    config: UnloadConfig,
    state: UnloadState,
    wait_remaining: u32,
    target: Option<ItemId>,
    destination: Option<Cell>,
    /// Units to move on the next transfer, or `-1` when none is in flight.
    #[serde(default = "no_count")]
    count_to_drop: i32,
    #[serde(default)]
    holds_claim: bool,
    #[serde(default)]
    cycles: u32,
}

impl UnloadJob {
    /// Start a job for `agent`. The first selection happens after one delay.
    pub fn new(agent: AgentId, config: UnloadConfig) -> Self {
        Self {
            agent,
            activity: ActivityId::new(),
            config,
            state: UnloadState::Waiting,
            wait_remaining: config.unload_delay_ticks,
            target: None,
            destination: None,
            count_to_drop: NO_COUNT,
            holds_claim: false,
            cycles: 0,
        }
    }

    /// The unloading agent.
    pub const fn agent(&self) -> AgentId {
        self.agent
    }

    /// This job's activity id (the reservation claimant).
    pub const fn activity(&self) -> ActivityId {
        self.activity
    }

    /// Current state.
    pub const fn state(&self) -> UnloadState {
        self.state
    }

    /// The item currently being moved.
    pub const fn target(&self) -> Option<ItemId> {
        self.target
    }

    /// The chosen destination cell.
    pub const fn destination(&self) -> Option<Cell> {
        self.destination
    }

    /// Units set aside for the next transfer, `-1` if none.
    pub const fn count_to_drop(&self) -> i32 {
        self.count_to_drop
    }

    /// Completed place-and-release cycles.
    pub const fn cycles(&self) -> u32 {
        self.cycles
    }

    /// The terminal outcome, if the job has finished.
    pub const fn outcome(&self) -> Option<JobOutcome> {
        match self.state {
            UnloadState::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Whether the job has finished.
    pub const fn is_finished(&self) -> bool {
        matches!(self.state, UnloadState::Finished(_))
    }

    /// Advance the job by one tick.
    ///
    /// Runs instant states until the job suspends or finishes. Events are
    /// appended to `journal` in the order they happen.
    pub fn tick(
        &mut self,
        world: &mut WorldMap,
        caps: &mut Capabilities<'_>,
        journal: &mut Vec<UnloadEvent>,
    ) -> JobStatus {
        for _ in 0..MAX_STEPS_PER_TICK {
            if let Some(outcome) = self.outcome() {
                return JobStatus::Finished(outcome);
            }
            let flow = match self.step(world, caps, journal) {
                Ok(flow) => flow,
                Err(err) => {
                    warn!(agent = %self.agent, state = ?self.state, %err, "Unload step failed");
                    self.finish(
                        world,
                        caps,
                        journal,
                        JobOutcome::Incompletable(IncompletableReason::WorldFault),
                    );
                    Flow::Continue
                }
            };
            if matches!(flow, Flow::Suspend) {
                break;
            }
        }
        self.outcome().map_or(JobStatus::Running, JobStatus::Finished)
    }

    /// Interrupt the job. Cleans up and ends `Cancelled`; no-op once finished.
    pub fn cancel(
        &mut self,
        world: &mut WorldMap,
        caps: &mut Capabilities<'_>,
        journal: &mut Vec<UnloadEvent>,
    ) {
        if !self.is_finished() {
            self.finish(world, caps, journal, JobOutcome::Cancelled);
        }
    }

    fn step(
        &mut self,
        world: &mut WorldMap,
        caps: &mut Capabilities<'_>,
        journal: &mut Vec<UnloadEvent>,
    ) -> Result<Flow, UnloadError> {
        match self.state {
            UnloadState::Waiting => Ok(self.wait()),
            UnloadState::FindingSpot => self.find_spot(world, caps, journal),
            UnloadState::Reserving => self.reserve(world, caps, journal),
            UnloadState::Transferring => self.transfer(world, caps, journal),
            UnloadState::Traveling => self.travel(world, caps, journal),
            UnloadState::Placing => self.place(world, journal),
            UnloadState::Releasing => self.release(caps, journal),
            UnloadState::Finished(_) => Ok(Flow::Suspend),
        }
    }

    /// Enter Waiting. A positive delay ends the tick here.
    const fn enter_wait(&mut self) -> Flow {
        self.state = UnloadState::Waiting;
        self.wait_remaining = self.config.unload_delay_ticks;
        if self.wait_remaining > 0 {
            Flow::Suspend
        } else {
            Flow::Continue
        }
    }

    fn wait(&mut self) -> Flow {
        if self.wait_remaining > 0 {
            self.wait_remaining = self.wait_remaining.saturating_sub(1);
            if self.wait_remaining > 0 {
                return Flow::Suspend;
            }
        }
        self.transition(UnloadState::FindingSpot);
        Flow::Continue
    }

    fn find_spot(
        &mut self,
        world: &mut WorldMap,
        caps: &mut Capabilities<'_>,
        journal: &mut Vec<UnloadEvent>,
    ) -> Result<Flow, UnloadError> {
        let Some(pick) = CarriedSurplusReconciler::first_unloadable(world, self.agent, journal)?
        else {
            let left = world.require_pawn(self.agent)?.hauled.len();
            if left > 0 {
                warn!(agent = %self.agent, left, "Tracked items left with nothing to unload");
            }
            self.finish(world, caps, journal, JobOutcome::Succeeded);
            return Ok(Flow::Continue);
        };

        let found = caps
            .resolver
            .find_cell(world, pick.item, self.agent, &*caps.reservations);

        let Some(cell) = found else {
            warn!(
                agent = %self.agent,
                item = %pick.item,
                count = pick.count,
                "No storage for item, dropping it"
            );
            let landings = world.drop_near(self.agent, pick.item, pick.count)?;
            self.untrack(world, pick.item);
            record_drops(journal, &landings);
            self.finish(world, caps, journal, JobOutcome::Succeeded);
            return Ok(Flow::Continue);
        };

        let def_name = world.require_item(pick.item)?.def_name.clone();
        self.target = Some(pick.item);
        self.destination = Some(cell);
        self.count_to_drop = i32::try_from(pick.count).unwrap_or(i32::MAX);
        debug!(
            agent = %self.agent,
            item = %pick.item,
            def = %def_name,
            count = pick.count,
            %cell,
            "Selected unload target"
        );
        journal.push(UnloadEvent::TargetSelected {
            item: pick.item,
            def_name,
            count: pick.count,
            destination: cell,
        });
        self.transition(UnloadState::Reserving);
        Ok(Flow::Continue)
    }

    fn reserve(
        &mut self,
        world: &mut WorldMap,
        caps: &mut Capabilities<'_>,
        journal: &mut Vec<UnloadEvent>,
    ) -> Result<Flow, UnloadError> {
        let cell = self.require_destination()?;
        match caps.reservations.reserve(cell, self.agent, self.activity) {
            Ok(()) => {
                self.holds_claim = true;
                journal.push(UnloadEvent::Reserved { cell });
                self.transition(UnloadState::Transferring);
            }
            Err(err) => {
                debug!(agent = %self.agent, %cell, %err, "Reservation denied");
                self.finish(
                    world,
                    caps,
                    journal,
                    JobOutcome::Incompletable(IncompletableReason::ReservationDenied),
                );
            }
        }
        Ok(Flow::Continue)
    }

    fn transfer(
        &mut self,
        world: &mut WorldMap,
        caps: &mut Capabilities<'_>,
        journal: &mut Vec<UnloadEvent>,
    ) -> Result<Flow, UnloadError> {
        let target = self
            .target
            .filter(|t| world.inventory_contains(self.agent, *t));
        let Some(target) = target else {
            if let Some(lost) = self.target.take() {
                debug!(agent = %self.agent, item = %lost, "Target left the inventory, restarting");
                self.untrack(world, lost);
                journal.push(UnloadEvent::TargetLost { item: lost });
            }
            self.release_claim(caps, journal);
            self.count_to_drop = NO_COUNT;
            return Ok(self.enter_wait());
        };

        let stack = world.require_item(target)?.stack_count;
        let count = u32::try_from(self.count_to_drop)
            .ok()
            .filter(|c| *c > 0)
            .map_or(stack, |c| c.min(stack));
        let storable = world.item_def(target).is_some_and(|d| d.ever_storable);
        let capable = world.require_pawn(self.agent)?.capable_of_manipulation;

        if !capable || !storable {
            warn!(
                agent = %self.agent,
                item = %target,
                capable,
                storable,
                "Cannot haul item, dropping it"
            );
            let landings = world.drop_near(self.agent, target, count)?;
            self.untrack(world, target);
            for landing in &landings {
                world.set_forbidden(landing.item, false)?;
            }
            record_drops(journal, &landings);
            self.recompute(world, caps);
            self.finish(world, caps, journal, JobOutcome::Succeeded);
            return Ok(Flow::Continue);
        }

        if let Some(held) = world.require_pawn(self.agent)?.carried {
            warn!(agent = %self.agent, item = %held, "Carry slot occupied, dropping its contents");
            let held_count = world.require_item(held)?.stack_count;
            let landings = world.drop_near(self.agent, held, held_count)?;
            record_drops(journal, &landings);
        }

        let carried = world.transfer_to_carry(self.agent, target, count)?;
        self.untrack(world, target);
        world.set_forbidden(carried, false)?;
        self.target = Some(carried);
        debug!(agent = %self.agent, from = %target, %carried, count, "Moved to carry slot");
        journal.push(UnloadEvent::Transferred {
            from: target,
            carried,
            count,
        });
        self.recompute(world, caps);
        self.transition(UnloadState::Traveling);
        Ok(Flow::Continue)
    }

    fn travel(
        &mut self,
        world: &mut WorldMap,
        caps: &mut Capabilities<'_>,
        journal: &mut Vec<UnloadEvent>,
    ) -> Result<Flow, UnloadError> {
        let cell = self.require_destination()?;
        match caps.movement.advance(world, self.agent, cell) {
            TravelStatus::Arrived => {
                self.transition(UnloadState::Placing);
                Ok(Flow::Continue)
            }
            TravelStatus::EnRoute => Ok(Flow::Suspend),
            TravelStatus::Blocked => {
                warn!(agent = %self.agent, %cell, "Destination unreachable");
                self.finish(
                    world,
                    caps,
                    journal,
                    JobOutcome::Incompletable(IncompletableReason::PathBlocked),
                );
                Ok(Flow::Continue)
            }
        }
    }

    fn place(
        &mut self,
        world: &mut WorldMap,
        journal: &mut Vec<UnloadEvent>,
    ) -> Result<Flow, UnloadError> {
        let cell = self.require_destination()?;
        let placement = world.place_carried(self.agent, cell)?;
        if placement.redirected_from(cell) {
            warn!(agent = %self.agent, %cell, "Destination full, placed elsewhere");
        }
        for landing in &placement.landings {
            if landing.in_storage {
                journal.push(UnloadEvent::Placed {
                    item: landing.item,
                    cell: landing.cell,
                    count: landing.count,
                });
            } else {
                journal.push(UnloadEvent::Dropped {
                    item: landing.item,
                    cell: landing.cell,
                    count: landing.count,
                });
            }
        }
        self.target = None;
        self.transition(UnloadState::Releasing);
        Ok(Flow::Continue)
    }

    fn release(
        &mut self,
        caps: &mut Capabilities<'_>,
        journal: &mut Vec<UnloadEvent>,
    ) -> Result<Flow, UnloadError> {
        let cell = self.require_destination()?;
        if self.config.skip_release_on_place {
            debug!(agent = %self.agent, %cell, "Leaving destination claim in place");
        } else if caps
            .reservations
            .is_reserved_by(cell, self.agent, self.activity)
        {
            caps.reservations.release(cell, self.agent, self.activity);
            journal.push(UnloadEvent::Released { cell });
            self.holds_claim = false;
        }
        self.cycles = self.cycles.saturating_add(1);
        info!(agent = %self.agent, %cell, cycles = self.cycles, "Unload cycle complete");
        Ok(self.enter_wait())
    }

    /// End the job with `outcome`, releasing claims and emptying the carry slot.
    fn finish(
        &mut self,
        world: &mut WorldMap,
        caps: &mut Capabilities<'_>,
        journal: &mut Vec<UnloadEvent>,
        outcome: JobOutcome,
    ) {
        let held = world.pawn(self.agent).and_then(|p| p.carried);
        if let Some(held) = held {
            let count = world.item(held).map_or(0, |i| i.stack_count);
            match world.drop_near(self.agent, held, count) {
                Ok(landings) => record_drops(journal, &landings),
                Err(err) => {
                    warn!(agent = %self.agent, item = %held, %err, "Could not empty carry slot");
                }
            }
        }

        self.release_claim(caps, journal);
        caps.reservations.release_all(self.agent, self.activity);

        self.state = UnloadState::Finished(outcome);
        self.count_to_drop = NO_COUNT;
        journal.push(UnloadEvent::Finished { outcome });
        info!(agent = %self.agent, ?outcome, cycles = self.cycles, "Unload job finished");
    }

    /// Release the current destination claim, if this cycle took one.
    fn release_claim(&mut self, caps: &mut Capabilities<'_>, journal: &mut Vec<UnloadEvent>) {
        if !self.holds_claim {
            return;
        }
        self.holds_claim = false;
        let Some(cell) = self.destination else {
            return;
        };
        if caps
            .reservations
            .is_reserved_by(cell, self.agent, self.activity)
        {
            caps.reservations.release(cell, self.agent, self.activity);
            journal.push(UnloadEvent::Released { cell });
        }
    }

    fn untrack(&self, world: &mut WorldMap, item: ItemId) {
        if let Some(pawn) = world.pawn_mut(self.agent) {
            pawn.hauled.remove(item);
        }
    }

    fn recompute(&self, world: &WorldMap, caps: &mut Capabilities<'_>) {
        if self.config.recompute_inventory_after_transfer {
            caps.hooks.recompute_inventory(world, self.agent);
        }
    }

    fn require_destination(&self) -> Result<Cell, UnloadError> {
        self.destination
            .ok_or(UnloadError::MissingDestination { state: self.state })
    }

    fn transition(&mut self, next: UnloadState) {
        debug!(agent = %self.agent, from = ?self.state, to = ?next, "State transition");
        self.state = next;
    }
}

fn record_drops(journal: &mut Vec<UnloadEvent>, landings: &[Landing]) {
    journal.extend(landings.iter().map(|l| UnloadEvent::Dropped {
        item: l.item,
        cell: l.cell,
        count: l.count,
    }));
}
