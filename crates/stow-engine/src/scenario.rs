//! Seeded demo scenario for the engine.
//!
//! Pawns are scattered over the open part of the map. Each one picks up a
//! handful of random ground stacks into its inventory, which tracks them
//! for unloading exactly the way opportunistic hauling would. The same seed
//! always produces the same layout.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stow_core::config::WorldConfig;
use stow_types::{AgentId, Cell, ItemDef};
use stow_world::{Pawn, WorldMap};
use tracing::{debug, info};

use crate::error::EngineError;

/// Built-in pool of pawn names, reused round-robin.
const NAME_POOL: &[&str] = &[
    "Alder", "Birch", "Cedar", "Dusk", "Ember", "Fern", "Grove", "Haze", "Iris", "Juniper",
    "Kestrel", "Lark", "Moss", "Nettle", "Oak", "Pine",
];

/// Chance that a pawn cannot manipulate items and can only drop them.
const INCAPABLE_CHANCE: f64 = 0.1;

/// Random placement attempts before falling back to a full scan.
const PLACEMENT_ATTEMPTS: u32 = 32;

/// Result of seeding the scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Pawns created, in creation order.
    pub agents: Vec<AgentId>,
    /// Ground stacks picked up across all pawns.
    pub stacks_picked: u32,
}

/// Populate `world` with pawns carrying tracked inventory.
///
/// # Errors
///
/// Returns [`EngineError::Scenario`] if the map has no room or no defs, or
/// [`EngineError::World`] if a spawn or pickup fails.
pub fn seed_scenario(world: &mut WorldMap, config: &WorldConfig) -> Result<Scenario, EngineError> {
    if world.width() <= 0 || world.height() <= 0 {
        return Err(EngineError::Scenario {
            message: format!("map is {}x{}", world.width(), world.height()),
        });
    }
    let defs: Vec<ItemDef> = world.defs().iter().cloned().collect();
    if defs.is_empty() {
        return Err(EngineError::Scenario {
            message: String::from("no item defs registered"),
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut agents = Vec::new();
    let mut stacks_picked = 0_u32;

    let agent_count = usize::try_from(config.agents).unwrap_or(0);
    for (n, name) in NAME_POOL.iter().cycle().take(agent_count).enumerate() {
        let position = open_cell(world, &mut rng).ok_or_else(|| EngineError::Scenario {
            message: format!("no open cell for pawn {n}"),
        })?;
        let mut pawn = Pawn::new(name, position);
        pawn.capable_of_manipulation = !rng.random_bool(INCAPABLE_CHANCE);
        let capable = pawn.capable_of_manipulation;
        let agent = world.add_pawn(pawn);

        for _ in 0..config.items_per_agent {
            let Some(def) = defs.get(rng.random_range(0..defs.len())) else {
                continue;
            };
            let count = rng.random_range(1..=def.stack_limit.max(1));
            let Some(cell) = open_cell(world, &mut rng) else {
                break;
            };
            let ground = world.spawn_on_ground(&def.def_name, count, cell)?;
            world.pick_up_to_inventory(agent, ground, count)?;
            stacks_picked = stacks_picked.saturating_add(1);
            debug!(%agent, def = %def.def_name, count, %cell, "Picked up stack");
        }

        info!(
            %agent,
            name = %name,
            %position,
            capable,
            tracked = world.pawn(agent).map_or(0, |p| p.hauled.len()),
            "Pawn spawned"
        );
        agents.push(agent);
    }

    Ok(Scenario {
        agents,
        stacks_picked,
    })
}

/// A cell outside storage with nothing on the ground.
fn open_cell(world: &WorldMap, rng: &mut impl Rng) -> Option<Cell> {
    let is_open =
        |c: Cell| world.storage().zone_at(c).is_none() && world.ground_at(c).is_none();

    for _ in 0..PLACEMENT_ATTEMPTS {
        let cell = Cell::new(
            rng.random_range(0..world.width()),
            rng.random_range(0..world.height()),
        );
        if is_open(cell) {
            return Some(cell);
        }
    }

    (0..world.height())
        .flat_map(|y| (0..world.width()).map(move |x| Cell::new(x, y)))
        .find(|c| is_open(*c))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stow_world::create_starting_world;

    use super::*;

    fn config(seed: u64) -> WorldConfig {
        WorldConfig {
            seed,
            width: 16,
            height: 12,
            agents: 3,
            items_per_agent: 4,
            ..WorldConfig::default()
        }
    }

    #[test]
    fn seeds_pawns_with_tracked_inventory() {
        let (mut world, _) = create_starting_world(16, 12).unwrap();
        let scenario = seed_scenario(&mut world, &config(7)).unwrap();

        assert_eq!(scenario.agents.len(), 3);
        assert_eq!(scenario.stacks_picked, 12);
        for agent in &scenario.agents {
            let pawn = world.pawn(*agent).unwrap();
            assert!(!pawn.hauled.is_empty());
            assert!(world.storage().zone_at(pawn.position).is_none());
        }
    }

    #[test]
    fn same_seed_same_layout() {
        let layout = |seed| {
            let (mut world, _) = create_starting_world(16, 12).unwrap();
            let scenario = seed_scenario(&mut world, &config(seed)).unwrap();
            scenario
                .agents
                .iter()
                .map(|a| {
                    let pawn = world.pawn(*a).unwrap();
                    (pawn.name.clone(), pawn.position, pawn.inventory.len())
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(layout(3), layout(3));
    }

    #[test]
    fn empty_map_is_rejected() {
        let mut world = WorldMap::new(0, 0);
        assert!(matches!(
            seed_scenario(&mut world, &config(1)),
            Err(EngineError::Scenario { .. })
        ));
    }
}
