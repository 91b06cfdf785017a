//! End-to-end properties of the unload activity.
//!
//! Each test builds a small world, tracks items in an agent's inventory the
//! way a pickup would, and drives the activity through the scheduler with
//! the default capabilities (and a recording ledger where claims matter).

#![allow(missing_docs, clippy::unwrap_used)]

use std::collections::BTreeMap;

use stow_core::{
    Capabilities, GridWalker, NoopHooks, ReservationBook, ReservationError, ReservationLedger,
    Scheduler, StorageResolver, UnloadConfig, UnloadJob, UnloadState,
};
use stow_types::{
    ActivityId, AgentId, Cell, ItemDef, ItemId, JobOutcome, UnloadEvent, UnloadRecord, Whereabouts,
};
use stow_world::{Pawn, WorldMap, create_starting_world};

/// Reservation book that counts every claim taken and given back.
#[derive(Debug, Default)]
struct RecordingLedger {
    inner: ReservationBook,
    reserved: u32,
    released: u32,
    denied: u32,
}

impl ReservationLedger for RecordingLedger {
    fn reserve(
        &mut self,
        cell: Cell,
        agent: AgentId,
        activity: ActivityId,
    ) -> Result<(), ReservationError> {
        let result = self.inner.reserve(cell, agent, activity);
        if result.is_ok() {
            self.reserved = self.reserved.saturating_add(1);
        } else {
            self.denied = self.denied.saturating_add(1);
        }
        result
    }

    fn release(&mut self, cell: Cell, agent: AgentId, activity: ActivityId) {
        if self.inner.is_reserved_by(cell, agent, activity) {
            self.released = self.released.saturating_add(1);
        }
        self.inner.release(cell, agent, activity);
    }

    fn is_reserved_by(&self, cell: Cell, agent: AgentId, activity: ActivityId) -> bool {
        self.inner.is_reserved_by(cell, agent, activity)
    }

    fn holder(&self, cell: Cell) -> Option<AgentId> {
        self.inner.holder(cell)
    }

    fn release_all(&mut self, agent: AgentId, activity: ActivityId) {
        self.inner.release_all(agent, activity);
    }
}

struct Rig {
    resolver: StorageResolver,
    ledger: RecordingLedger,
    walker: GridWalker,
    hooks: NoopHooks,
}

impl Rig {
    fn new() -> Self {
        Self {
            resolver: StorageResolver::new(),
            ledger: RecordingLedger::default(),
            walker: GridWalker::new(2),
            hooks: NoopHooks,
        }
    }

    fn caps(&mut self) -> Capabilities<'_> {
        Capabilities {
            resolver: &self.resolver,
            reservations: &mut self.ledger,
            movement: &mut self.walker,
            hooks: &mut self.hooks,
        }
    }

    /// Tick until idle; returns the number of ticks used.
    fn run(&mut self, scheduler: &mut Scheduler, world: &mut WorldMap, max_ticks: u32) -> u32 {
        let mut ticks = 0_u32;
        while !scheduler.is_idle() && ticks < max_ticks {
            scheduler.tick(world, &mut self.caps());
            ticks = ticks.saturating_add(1);
        }
        ticks
    }
}

fn quick() -> UnloadConfig {
    UnloadConfig {
        unload_delay_ticks: 1,
        ..UnloadConfig::default()
    }
}

/// Drop a stack on the ground and pick it up into the agent's inventory.
fn pick(world: &mut WorldMap, agent: AgentId, def: &str, count: u32, cell: Cell) -> ItemId {
    let id = world.spawn_on_ground(def, count, cell).unwrap();
    world.pick_up_to_inventory(agent, id, count).unwrap()
}

fn loaded_world() -> (WorldMap, AgentId) {
    let (mut world, _) = create_starting_world(12, 10).unwrap();
    let agent = world.add_pawn(Pawn::new("Ada", Cell::new(6, 5)));
    pick(&mut world, agent, "Steel", 30, Cell::new(3, 4));
    pick(&mut world, agent, "Berries", 20, Cell::new(4, 4));
    pick(&mut world, agent, "ChunkGranite", 1, Cell::new(5, 4));
    pick(&mut world, agent, "ComponentIndustrial", 10, Cell::new(7, 4));
    pick(&mut world, agent, "WoodLog", 75, Cell::new(8, 4));
    (world, agent)
}

fn units_by_def(world: &WorldMap) -> BTreeMap<String, u64> {
    world
        .defs()
        .iter()
        .map(|d| (d.def_name.clone(), world.total_units(&d.def_name)))
        .collect()
}

fn selected_defs(journal: &[UnloadRecord]) -> Vec<String> {
    journal
        .iter()
        .filter_map(|r| match &r.event {
            UnloadEvent::TargetSelected { def_name, .. } => Some(def_name.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn every_job_terminates_and_nothing_is_lost() {
    let (mut world, agent) = loaded_world();
    let before = units_by_def(&world);

    let mut scheduler = Scheduler::new(quick());
    scheduler.start_unload(&world, agent).unwrap();
    let mut rig = Rig::new();
    let ticks = rig.run(&mut scheduler, &mut world, 1_000);

    assert!(scheduler.is_idle(), "still running after {ticks} ticks");
    assert_eq!(scheduler.outcome(agent), Some(JobOutcome::Succeeded));
    assert_eq!(units_by_def(&world), before);

    let pawn = world.pawn(agent).unwrap();
    assert!(pawn.hauled.is_empty());
    assert!(pawn.inventory.is_empty());
    assert!(pawn.carried.is_none());
    assert!(world.items().all(|i| matches!(i.whereabouts, Whereabouts::Ground(_))));
}

#[test]
fn unload_order_is_deterministic() {
    let mut runs = Vec::new();
    for _ in 0..2 {
        let (mut world, agent) = loaded_world();
        let mut scheduler = Scheduler::new(quick());
        scheduler.start_unload(&world, agent).unwrap();
        Rig::new().run(&mut scheduler, &mut world, 1_000);
        runs.push(selected_defs(scheduler.journal()));
    }

    let first = runs.first().cloned().unwrap();
    assert_eq!(Some(&first), runs.last());
    assert_eq!(
        first,
        [
            "ChunkGranite",
            "Berries",
            "Steel",
            "WoodLog",
            "ComponentIndustrial"
        ]
    );
}

#[test]
fn stale_reference_after_merge_is_repaired() {
    let (mut world, _) = create_starting_world(12, 10).unwrap();
    let agent = world.add_pawn(Pawn::new("Ada", Cell::new(2, 5)));
    let first = pick(&mut world, agent, "Steel", 5, Cell::new(1, 4));
    let second = pick(&mut world, agent, "Steel", 4, Cell::new(2, 4));
    assert!(!world.is_alive(second));
    assert_eq!(world.pawn(agent).unwrap().hauled.len(), 2);

    let mut scheduler = Scheduler::new(quick());
    scheduler.start_unload(&world, agent).unwrap();
    Rig::new().run(&mut scheduler, &mut world, 500);

    assert_eq!(scheduler.outcome(agent), Some(JobOutcome::Succeeded));
    let events: Vec<&UnloadEvent> = scheduler.journal().iter().map(|r| &r.event).collect();
    assert!(events.iter().any(|e| matches!(
        e,
        UnloadEvent::Transferred { from, count: 9, .. } if *from == first
    )));
    assert!(events.contains(&&UnloadEvent::StaleEntryRemoved { stale: second }));
    assert_eq!(world.total_units("Steel"), 9);
    assert!(world.pawn(agent).unwrap().hauled.is_empty());
}

#[test]
fn straggler_substitutes_for_stale_reference() {
    let (mut world, _) = create_starting_world(12, 10).unwrap();
    let agent = world.add_pawn(Pawn::new("Ada", Cell::new(2, 5)));
    let first = pick(&mut world, agent, "Steel", 5, Cell::new(1, 4));
    let second = pick(&mut world, agent, "Steel", 4, Cell::new(2, 4));
    // Only the stale handle is left tracked.
    world.pawn_mut(agent).unwrap().hauled.remove(first);

    let mut scheduler = Scheduler::new(quick());
    scheduler.start_unload(&world, agent).unwrap();
    Rig::new().run(&mut scheduler, &mut world, 500);

    let events: Vec<&UnloadEvent> = scheduler.journal().iter().map(|r| &r.event).collect();
    assert!(events.contains(&&UnloadEvent::StragglerSubstituted {
        stale: second,
        straggler: first,
    }));
    assert!(world.inventory_items(agent).is_empty());
    assert_eq!(scheduler.outcome(agent), Some(JobOutcome::Succeeded));
}

#[test]
fn every_claim_is_released() {
    let (mut world, agent) = loaded_world();
    let mut scheduler = Scheduler::new(quick());
    scheduler.start_unload(&world, agent).unwrap();
    let mut rig = Rig::new();
    rig.run(&mut scheduler, &mut world, 1_000);

    let cycles = u32::try_from(selected_defs(scheduler.journal()).len()).unwrap();
    assert_eq!(rig.ledger.reserved, cycles);
    assert_eq!(rig.ledger.released, cycles);
    assert!(rig.ledger.inner.is_empty());
}

#[test]
fn claim_is_released_when_placement_lands_elsewhere() {
    let (mut world, _) = create_starting_world(12, 10).unwrap();
    let agent = world.add_pawn(Pawn::new("Ada", Cell::new(6, 8)));
    pick(&mut world, agent, "Steel", 12, Cell::new(6, 7));

    let mut scheduler = Scheduler::new(quick());
    scheduler.start_unload(&world, agent).unwrap();
    let mut rig = Rig::new();
    while scheduler
        .job(agent)
        .is_some_and(|j| j.state() != UnloadState::Traveling)
    {
        scheduler.tick(&mut world, &mut rig.caps());
    }
    let dest = scheduler.job(agent).and_then(UnloadJob::destination).unwrap();

    // Someone else fills the claimed cell with a different def meanwhile.
    world.spawn_on_ground("WoodLog", 10, dest).unwrap();
    rig.run(&mut scheduler, &mut world, 500);

    assert_eq!(scheduler.outcome(agent), Some(JobOutcome::Succeeded));
    let events: Vec<&UnloadEvent> = scheduler.journal().iter().map(|r| &r.event).collect();
    let placed: Vec<Cell> = events
        .iter()
        .filter_map(|e| match e {
            UnloadEvent::Placed { cell, .. } => Some(*cell),
            _ => None,
        })
        .collect();
    assert!(!placed.is_empty());
    assert!(placed.iter().all(|c| *c != dest));
    assert_eq!(
        events
            .iter()
            .filter(|e| ***e == UnloadEvent::Released { cell: dest })
            .count(),
        1
    );
    assert_eq!(rig.ledger.reserved, 1);
    assert_eq!(rig.ledger.reserved, rig.ledger.released);
    assert!(rig.ledger.inner.is_empty());
    assert_eq!(world.total_units("Steel"), 12);
    assert_eq!(world.ground_at(dest).unwrap().def_name, "WoodLog");
}

#[test]
fn contested_cell_ends_job_incompletable_and_frees_nothing_else() {
    let (mut world, _) = create_starting_world(4, 4).unwrap();
    let agent = world.add_pawn(Pawn::new("Ada", Cell::new(0, 2)));
    pick(&mut world, agent, "ChunkGranite", 1, Cell::new(1, 2));

    let mut rig = Rig::new();
    // Every dump cell is claimed under this agent by a different activity,
    // which the resolver does not skip but the ledger denies.
    let other = ActivityId::new();
    for x in 0..4 {
        rig.ledger.inner.reserve(Cell::new(x, 3), agent, other).unwrap();
    }

    let mut scheduler = Scheduler::new(quick());
    scheduler.start_unload(&world, agent).unwrap();
    rig.run(&mut scheduler, &mut world, 100);

    assert_eq!(
        scheduler.outcome(agent),
        Some(JobOutcome::Incompletable(
            stow_types::IncompletableReason::ReservationDenied
        ))
    );
    assert_eq!(rig.ledger.denied, 1);
    assert_eq!(rig.ledger.inner.len(), 4);
    assert_eq!(world.inventory_items(agent).len(), 1);
}

#[test]
fn unstorable_item_is_dropped_and_job_succeeds() {
    let (mut world, _) = create_starting_world(12, 10).unwrap();
    world
        .register_def(ItemDef::new("Slag", None, 20).never_storable())
        .unwrap();
    let agent = world.add_pawn(Pawn::new("Ada", Cell::new(6, 5)));
    let slag = pick(&mut world, agent, "Slag", 7, Cell::new(6, 4));

    let mut scheduler = Scheduler::new(quick());
    scheduler.start_unload(&world, agent).unwrap();
    let mut rig = Rig::new();
    rig.run(&mut scheduler, &mut world, 100);

    assert_eq!(scheduler.outcome(agent), Some(JobOutcome::Succeeded));
    assert_eq!(rig.ledger.reserved, 0);
    let dropped = world.ground_at(Cell::new(6, 5)).unwrap();
    assert_eq!(dropped.def_name, "Slag");
    assert_eq!(dropped.stack_count, 7);
    let pawn = world.pawn(agent).unwrap();
    assert!(!pawn.hauled.contains(slag));
    assert!(pawn.hauled.is_empty());
    assert!(pawn.inventory.is_empty());
}

#[test]
fn empty_set_finishes_on_first_selection() {
    let (mut world, _) = create_starting_world(12, 10).unwrap();
    let agent = world.add_pawn(Pawn::new("Ada", Cell::new(6, 5)));

    let mut scheduler = Scheduler::new(quick());
    scheduler.start_unload(&world, agent).unwrap();
    let mut rig = Rig::new();
    let ticks = rig.run(&mut scheduler, &mut world, 100);

    assert_eq!(ticks, 1);
    assert_eq!(scheduler.outcome(agent), Some(JobOutcome::Succeeded));
    assert_eq!(rig.ledger.reserved, 0);
    assert_eq!(scheduler.journal().len(), 1);
}

#[test]
fn saved_job_resumes_with_its_transfer_count() {
    let (mut world, _) = create_starting_world(12, 10).unwrap();
    let agent = world.add_pawn(Pawn::new("Ada", Cell::new(6, 8)));
    pick(&mut world, agent, "Steel", 12, Cell::new(6, 7));

    let mut scheduler = Scheduler::new(quick());
    scheduler.start_unload(&world, agent).unwrap();
    let mut rig = Rig::new();
    scheduler.tick(&mut world, &mut rig.caps());

    let job = scheduler.job(agent).unwrap();
    assert_eq!(job.state(), UnloadState::Traveling);
    assert_eq!(job.count_to_drop(), 12);

    let json = serde_json::to_string(job).unwrap();
    let restored: UnloadJob = serde_json::from_str(&json).unwrap();
    assert_eq!(&restored, job);

    let mut resumed = Scheduler::new(quick());
    resumed.resume(restored).unwrap();
    rig.run(&mut resumed, &mut world, 500);
    assert_eq!(resumed.outcome(agent), Some(JobOutcome::Succeeded));
    assert_eq!(world.total_units("Steel"), 12);
    assert!(world.pawn(agent).unwrap().carried.is_none());
}

#[test]
fn missing_transfer_count_defaults_to_none_in_flight() {
    let job = UnloadJob::new(AgentId::new(), UnloadConfig::default());
    let mut value = serde_json::to_value(&job).unwrap();
    value.as_object_mut().unwrap().remove("count_to_drop");
    let restored: UnloadJob = serde_json::from_value(value).unwrap();
    assert_eq!(restored.count_to_drop(), -1);
}

#[test]
fn cancel_mid_cycle_leaves_no_claim_or_carried_item() {
    let (mut world, agent) = loaded_world();
    let before = units_by_def(&world);
    let mut scheduler = Scheduler::new(quick());
    scheduler.start_unload(&world, agent).unwrap();
    let mut rig = Rig::new();

    while scheduler
        .job(agent)
        .is_some_and(|j| j.state() != UnloadState::Traveling)
    {
        scheduler.tick(&mut world, &mut rig.caps());
    }
    assert!(world.pawn(agent).unwrap().carried.is_some());

    let outcome = scheduler.cancel(agent, &mut world, &mut rig.caps());
    assert_eq!(outcome, Some(JobOutcome::Cancelled));
    assert!(rig.ledger.inner.is_empty());
    assert!(world.pawn(agent).unwrap().carried.is_none());
    assert_eq!(units_by_def(&world), before);
}
