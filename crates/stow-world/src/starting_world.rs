//! Default item defs and storage layout used by the engine's demo scenario.
//!
//! The layout is deterministic: a stockpile for raw resources along the top
//! edge, a food shelf in the top-right corner, and a low-priority dump along
//! the bottom edge that accepts anything storable. Randomness (where pawns
//! stand, what they picked up) is layered on by the engine.

use stow_types::{Cell, ItemDef, StoragePriority, ThingCategory};

use crate::error::WorldError;
use crate::storage::ZoneId;
use crate::world_map::WorldMap;

/// Zone ids of the starting layout.
#[derive(Debug, Clone, Copy)]
pub struct StartingZones {
    /// Raw resources stockpile.
    pub stockpile: ZoneId,
    /// Food shelf.
    pub pantry: ZoneId,
    /// Accept-all dump.
    pub dump: ZoneId,
}

/// Item defs of the starting world.
pub fn starting_defs() -> Vec<ItemDef> {
    let foods = ThingCategory::new(1, "Foods");
    let raw = ThingCategory::new(2, "ResourcesRaw");
    let manufactured = ThingCategory::new(3, "Manufactured");
    vec![
        ItemDef::new("Berries", Some(foods.clone()), 75),
        ItemDef::new("RawRice", Some(foods), 75),
        ItemDef::new("Steel", Some(raw.clone()), 75),
        ItemDef::new("WoodLog", Some(raw), 75),
        ItemDef::new("ComponentIndustrial", Some(manufactured.clone()), 25),
        ItemDef::new("MedicineHerbal", Some(manufactured), 25),
        ItemDef::new("ChunkGranite", None, 1),
        ItemDef::new("ShipChunk", None, 1).never_storable(),
    ]
}

/// Build a map of the given size with the starting defs and zones.
///
/// # Errors
///
/// Returns [`WorldError::DuplicateDef`] only if the def list is corrupted.
pub fn create_starting_world(
    width: i32,
    height: i32,
) -> Result<(WorldMap, StartingZones), WorldError> {
    let mut map = WorldMap::new(width, height);
    for def in starting_defs() {
        map.register_def(def)?;
    }

    let right = width.saturating_sub(1);
    let bottom = height.saturating_sub(1);
    let half = width.checked_div(2).unwrap_or(0);

    let stockpile = map.add_zone(
        "stockpile",
        StoragePriority::Preferred,
        &["ResourcesRaw", "Manufactured"],
        (0..half).map(|x| Cell::new(x, 0)),
    );
    let pantry = map.add_zone(
        "pantry",
        StoragePriority::Important,
        &["Foods"],
        (half..width).flat_map(|x| [Cell::new(x, 0), Cell::new(x, 1)]),
    );
    let dump = map.add_zone(
        "dump",
        StoragePriority::Low,
        &[],
        (0..=right).map(|x| Cell::new(x, bottom)),
    );

    Ok((
        map,
        StartingZones {
            stockpile,
            pantry,
            dump,
        },
    ))
}
