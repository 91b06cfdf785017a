//! Cooperative per-tick scheduler for unload jobs.
//!
//! Each call to [`Scheduler::tick`] advances every active job once, in agent
//! id order, so a run is deterministic for a given world and capability
//! set. Finished jobs leave the active set and their outcome is kept.
//! Events from every job are stamped with the tick, agent, and activity and
//! appended to one journal.

use std::collections::BTreeMap;

use stow_types::{ActivityId, AgentId, JobOutcome, UnloadRecord};
use stow_world::WorldMap;
use tracing::{debug, info};

use crate::capability::Capabilities;
use crate::config::UnloadConfig;
use crate::unload::{JobStatus, UnloadJob};

/// Errors returned when starting or resuming jobs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// The agent is not on the map.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// The agent already has an active unload job.
    #[error("agent {0} is already unloading")]
    AlreadyUnloading(AgentId),
}

/// What a single scheduler tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// The tick that just ran.
    pub tick: u64,
    /// Jobs still active after the tick.
    pub running: usize,
    /// Jobs that finished during the tick.
    pub finished: Vec<(AgentId, JobOutcome)>,
    /// Journal records produced during the tick.
    pub events: usize,
}

/// Drives unload jobs one tick at a time.
#[derive(Debug, Clone)]
pub struct Scheduler {
    tick: u64,
    config: UnloadConfig,
    jobs: BTreeMap<AgentId, UnloadJob>,
    outcomes: BTreeMap<AgentId, JobOutcome>,
    journal: Vec<UnloadRecord>,
}

impl Scheduler {
    /// Create a scheduler that starts jobs with `config`.
    pub const fn new(config: UnloadConfig) -> Self {
        Self {
            tick: 0,
            config,
            jobs: BTreeMap::new(),
            outcomes: BTreeMap::new(),
            journal: Vec::new(),
        }
    }

    /// Start an unload job for `agent`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AgentNotFound`] or
    /// [`SchedulerError::AlreadyUnloading`].
    pub fn start_unload(
        &mut self,
        world: &WorldMap,
        agent: AgentId,
    ) -> Result<ActivityId, SchedulerError> {
        if world.pawn(agent).is_none() {
            return Err(SchedulerError::AgentNotFound(agent));
        }
        let job = UnloadJob::new(agent, self.config);
        let activity = job.activity();
        self.resume(job)?;
        debug!(%agent, %activity, "Unload job started");
        Ok(activity)
    }

    /// Put a previously saved job back into the active set.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyUnloading`] if the agent already has
    /// an active job.
    pub fn resume(&mut self, job: UnloadJob) -> Result<(), SchedulerError> {
        let agent = job.agent();
        if self.jobs.contains_key(&agent) {
            return Err(SchedulerError::AlreadyUnloading(agent));
        }
        self.outcomes.remove(&agent);
        self.jobs.insert(agent, job);
        Ok(())
    }

    /// Cancel the agent's active job. Returns its outcome if one was active.
    pub fn cancel(
        &mut self,
        agent: AgentId,
        world: &mut WorldMap,
        caps: &mut Capabilities<'_>,
    ) -> Option<JobOutcome> {
        let mut job = self.jobs.remove(&agent)?;
        let mut events = Vec::new();
        job.cancel(world, caps, &mut events);
        self.stamp(&job, events);
        let outcome = job.outcome().unwrap_or(JobOutcome::Cancelled);
        self.outcomes.insert(agent, outcome);
        Some(outcome)
    }

    /// Advance every active job once.
    pub fn tick(&mut self, world: &mut WorldMap, caps: &mut Capabilities<'_>) -> TickSummary {
        self.tick = self.tick.saturating_add(1);
        let before = self.journal.len();
        let mut finished = Vec::new();

        let agents: Vec<AgentId> = self.jobs.keys().copied().collect();
        for agent in agents {
            let Some(mut job) = self.jobs.remove(&agent) else {
                continue;
            };
            let mut events = Vec::new();
            let status = job.tick(world, caps, &mut events);
            self.stamp(&job, events);
            match status {
                JobStatus::Running => {
                    self.jobs.insert(agent, job);
                }
                JobStatus::Finished(outcome) => {
                    self.outcomes.insert(agent, outcome);
                    finished.push((agent, outcome));
                }
            }
        }

        let summary = TickSummary {
            tick: self.tick,
            running: self.jobs.len(),
            finished,
            events: self.journal.len().saturating_sub(before),
        };
        if !summary.finished.is_empty() {
            info!(
                tick = summary.tick,
                finished = summary.finished.len(),
                running = summary.running,
                "Unload jobs finished"
            );
        }
        summary
    }

    fn stamp(&mut self, job: &UnloadJob, events: Vec<stow_types::UnloadEvent>) {
        let (tick, agent, activity) = (self.tick, job.agent(), job.activity());
        self.journal
            .extend(events.into_iter().map(|event| UnloadRecord {
                tick,
                agent,
                activity,
                event,
            }));
    }

    /// Whether no job is active.
    pub fn is_idle(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Ticks run so far.
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// The agent's active job.
    pub fn job(&self, agent: AgentId) -> Option<&UnloadJob> {
        self.jobs.get(&agent)
    }

    /// Active jobs in agent order.
    pub fn jobs(&self) -> impl Iterator<Item = &UnloadJob> {
        self.jobs.values()
    }

    /// Outcome of the agent's most recent finished job.
    pub fn outcome(&self, agent: AgentId) -> Option<JobOutcome> {
        self.outcomes.get(&agent).copied()
    }

    /// Outcomes of every finished job, by agent.
    pub const fn outcomes(&self) -> &BTreeMap<AgentId, JobOutcome> {
        &self.outcomes
    }

    /// Every record produced so far.
    pub fn journal(&self) -> &[UnloadRecord] {
        &self.journal
    }

    /// Drain the journal.
    pub fn take_journal(&mut self) -> Vec<UnloadRecord> {
        core::mem::take(&mut self.journal)
    }
}
