//! Engine binary for the Stow simulation.
//!
//! Wires the world, the default capabilities, and the unload scheduler
//! together and runs the tick loop on a fixed real-time interval.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `stow-config.yaml` (or `STOW_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the starting world (defs and storage zones)
//! 4. Seed the demo scenario (pawns with tracked inventory)
//! 5. Start an unload job for every pawn with tracked items
//! 6. Run the tick loop until idle, `max_ticks`, or Ctrl-C
//! 7. Print the run report

mod error;
mod report;
mod scenario;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use stow_core::{
    Capabilities, GridWalker, InventoryHooks, NoopHooks, ReservationBook, Scheduler,
    SimulationConfig, StorageResolver,
};
use stow_types::AgentId;
use stow_world::WorldMap;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::report::RunReport;

/// Inventory hooks that only log, standing in for a combat loadout tracker.
#[derive(Debug, Default)]
struct TraceHooks;

impl InventoryHooks for TraceHooks {
    fn recompute_inventory(&mut self, world: &WorldMap, agent: AgentId) {
        let stacks = world.inventory_items(agent).len();
        debug!(%agent, stacks, "Inventory recompute requested");
    }
}

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, logging, or world setup fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config = load_config().context("loading configuration")?;

    // 2. Initialize structured logging.
    init_logging(&config).context("initializing logging")?;
    info!("stow-engine starting");
    info!(
        seed = config.world.seed,
        width = config.world.width,
        height = config.world.height,
        tick_interval_ms = config.world.tick_interval_ms,
        slow_storage = config.compatibility.slow_storage_extension,
        combat_tracker = config.compatibility.combat_inventory_tracker,
        "Configuration loaded"
    );

    // 3. Create the starting world.
    let (mut world, zones) =
        stow_world::create_starting_world(config.world.width, config.world.height)
            .map_err(EngineError::from)
            .context("creating starting world")?;
    info!(
        stockpile = %zones.stockpile,
        pantry = %zones.pantry,
        dump = %zones.dump,
        "Starting world created"
    );

    // 4. Seed the scenario.
    let scenario =
        scenario::seed_scenario(&mut world, &config.world).context("seeding scenario")?;
    info!(
        pawns = scenario.agents.len(),
        stacks = scenario.stacks_picked,
        "Scenario seeded"
    );

    // 5. Start unload jobs.
    let unload = config.unload_config();
    let mut scheduler = Scheduler::new(unload);
    for agent in &scenario.agents {
        let tracked = world.pawn(*agent).map_or(0, |p| p.hauled.len());
        if tracked > 0 {
            scheduler
                .start_unload(&world, *agent)
                .map_err(EngineError::from)
                .context("starting unload job")?;
        }
    }
    info!(
        jobs = scheduler.jobs().count(),
        delay_ticks = unload.unload_delay_ticks,
        "Unload jobs started"
    );

    // 6. Run the tick loop.
    let resolver = StorageResolver::new();
    let mut book = ReservationBook::new();
    let mut walker = GridWalker::new(config.unload.walker_stride);
    let mut trace_hooks = TraceHooks;
    let mut noop_hooks = NoopHooks;
    let hooks: &mut dyn InventoryHooks = if config.compatibility.combat_inventory_tracker {
        &mut trace_hooks
    } else {
        &mut noop_hooks
    };
    let mut caps = Capabilities {
        resolver: &resolver,
        reservations: &mut book,
        movement: &mut walker,
        hooks,
    };

    let period = Duration::from_millis(config.world.tick_interval_ms.max(1));
    let mut interval = tokio::time::interval(period);
    let max_ticks = config.world.max_ticks;
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    warn!(%err, "Failed to listen for Ctrl-C");
                }
                info!("Interrupted, cancelling active jobs");
                cancel_all(&mut scheduler, &mut world, &mut caps);
                break;
            }
        }

        let summary = scheduler.tick(&mut world, &mut caps);
        for (agent, outcome) in &summary.finished {
            info!(tick = summary.tick, %agent, ?outcome, "Job finished");
        }
        if scheduler.is_idle() {
            info!(tick = summary.tick, "All unload jobs finished");
            break;
        }
        if max_ticks > 0 && summary.tick >= max_ticks {
            warn!(
                tick = summary.tick,
                running = summary.running,
                "Tick limit reached, cancelling"
            );
            cancel_all(&mut scheduler, &mut world, &mut caps);
            break;
        }
    }

    // 7. Report.
    let report = RunReport::collect(&world, &scheduler);
    info!(
        ticks = report.ticks,
        succeeded = report.succeeded(),
        jobs = report.jobs.len(),
        units_stored = report.units_stored,
        units_loose = report.units_loose,
        units_held = report.units_held,
        "stow-engine shutdown complete"
    );
    let json = serde_json::to_string_pretty(&report).context("serializing run report")?;
    println!("{json}");

    Ok(())
}

fn cancel_all(scheduler: &mut Scheduler, world: &mut WorldMap, caps: &mut Capabilities<'_>) {
    let active: Vec<AgentId> = scheduler.jobs().map(stow_core::UnloadJob::agent).collect();
    for agent in active {
        scheduler.cancel(agent, world, caps);
    }
}

/// Load the simulation configuration.
///
/// Uses `STOW_CONFIG` if set, otherwise `stow-config.yaml` in the working
/// directory. A missing file means defaults.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let path = std::env::var("STOW_CONFIG")
        .map_or_else(|_| PathBuf::from("stow-config.yaml"), PathBuf::from);
    if path.exists() {
        Ok(SimulationConfig::from_file(&path)?)
    } else {
        let mut config = SimulationConfig::default();
        config.logging.apply_env_overrides();
        Ok(config)
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(config: &SimulationConfig) -> Result<(), EngineError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.logging.level).map_err(|e| EngineError::Logging {
            message: format!("invalid log level {:?}: {e}", config.logging.level),
        })?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = if config.logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| EngineError::Logging {
        message: format!("{e}"),
    })
}
