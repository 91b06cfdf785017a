//! Putting items down: into a chosen storage cell, into fallback cells when
//! the chosen one is full, or onto the ground near an agent.
//!
//! All operations move units cell by cell and never lose any: units that
//! cannot be put down anywhere stay with the source item, and the caller
//! gets [`WorldError::NoRoom`] with the leftover count.

use serde::{Deserialize, Serialize};
use stow_types::{AgentId, Cell, ItemId, Whereabouts};
use tracing::{debug, warn};

use crate::error::WorldError;
use crate::world_map::WorldMap;

/// Units of an item that came to rest in one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Landing {
    /// The stack now holding the units (the moved item, a split-off piece,
    /// or a same-def stack that absorbed them).
    pub item: ItemId,
    /// Cell the units landed in.
    pub cell: Cell,
    /// Units landed.
    pub count: u32,
    /// Whether the cell is valid storage for the item.
    pub in_storage: bool,
}

/// Result of putting a carried stack into storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Every cell that received units, in order.
    pub landings: Vec<Landing>,
}

impl Placement {
    /// Whether any units ended up somewhere other than `destination`.
    pub fn redirected_from(&self, destination: Cell) -> bool {
        self.landings.iter().any(|l| l.cell != destination)
    }

    /// Total units put down.
    pub fn total(&self) -> u32 {
        self.landings
            .iter()
            .map(|l| l.count)
            .fold(0_u32, u32::saturating_add)
    }
}

impl WorldMap {
    /// Move up to `count` units of `source` into `cell`.
    ///
    /// Returns `None` if the cell has no room for the def.
    fn land_units(
        &mut self,
        source: ItemId,
        count: u32,
        cell: Cell,
    ) -> Result<Option<Landing>, WorldError> {
        let def = self
            .item_def(source)
            .cloned()
            .ok_or(WorldError::ItemNotFound(source))?;
        let stack = self.require_item(source)?.stack_count;
        let moved = self.room_for(cell, &def).min(count).min(stack);
        if moved == 0 {
            return Ok(None);
        }
        let in_storage = self.storage().priority_for(cell, &def).is_some();

        let holder = if let Some(existing) = self.ground_id(cell) {
            self.add_units(existing, moved)?;
            self.take_units(source, moved)?;
            existing
        } else if moved == stack {
            self.detach(source)?;
            self.set_whereabouts(source, Whereabouts::Ground(cell))?;
            self.put_on_ground(cell, source);
            source
        } else {
            let piece = self.split_off(source, moved, Whereabouts::Ground(cell))?;
            self.put_on_ground(cell, piece);
            piece
        };

        Ok(Some(Landing {
            item: holder,
            cell,
            count: moved,
            in_storage,
        }))
    }

    /// Land as many of `remaining` units as the listed cells take, in order.
    fn land_in_cells(
        &mut self,
        source: ItemId,
        remaining: &mut u32,
        cells: impl IntoIterator<Item = Cell>,
        landings: &mut Vec<Landing>,
    ) -> Result<(), WorldError> {
        for cell in cells {
            if *remaining == 0 {
                break;
            }
            if let Some(landing) = self.land_units(source, *remaining, cell)? {
                *remaining = remaining
                    .checked_sub(landing.count)
                    .ok_or(WorldError::ArithmeticOverflow)?;
                landings.push(landing);
            }
        }
        Ok(())
    }

    /// Drop `count` units of an item the agent holds onto the ground,
    /// spiralling outward from the agent's cell.
    ///
    /// Works for inventory and carried items alike. Same-def ground stacks
    /// with room absorb units before empty cells further away are used.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NoRoom`] if the map cannot take every unit;
    /// the leftover units stay with the source item.
    pub fn drop_near(
        &mut self,
        agent: AgentId,
        item: ItemId,
        count: u32,
    ) -> Result<Vec<Landing>, WorldError> {
        let origin = self.require_pawn(agent)?.position;
        let stack = self.require_item(item)?.stack_count;
        let mut remaining = count.min(stack);
        let mut landings = Vec::new();

        let max_radius = self.width().max(self.height());
        for radius in 0..=max_radius {
            if remaining == 0 {
                break;
            }
            let ring: Vec<Cell> = origin
                .ring(radius)
                .into_iter()
                .filter(|c| self.in_bounds(*c))
                .collect();
            self.land_in_cells(item, &mut remaining, ring, &mut landings)?;
        }

        if remaining > 0 {
            warn!(%agent, %item, leftover = remaining, "no room to drop");
            return Err(WorldError::NoRoom {
                item,
                leftover: remaining,
            });
        }
        debug!(%agent, %item, cells = landings.len(), "dropped near agent");
        Ok(landings)
    }

    /// Put the agent's carried stack into `destination`.
    ///
    /// Fallback order when the destination cannot take every unit: other
    /// cells of the same zone nearest first, then any valid storage cell by
    /// priority and distance, then the ground near the agent.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NothingCarried`] if the carry slot is empty, or
    /// [`WorldError::NoRoom`] if not even a drop could take the leftovers.
    pub fn place_carried(
        &mut self,
        agent: AgentId,
        destination: Cell,
    ) -> Result<Placement, WorldError> {
        let carried = self
            .require_pawn(agent)?
            .carried
            .ok_or(WorldError::NothingCarried(agent))?;
        let def = self
            .item_def(carried)
            .cloned()
            .ok_or(WorldError::ItemNotFound(carried))?;
        let mut remaining = self.require_item(carried)?.stack_count;
        let mut landings = Vec::new();

        self.land_in_cells(carried, &mut remaining, [destination], &mut landings)?;

        if remaining > 0 {
            let mut same_zone: Vec<Cell> = self
                .storage()
                .zone_at(destination)
                .filter(|z| z.allows(&def))
                .map(|z| {
                    z.cells
                        .iter()
                        .copied()
                        .filter(|c| *c != destination)
                        .collect()
                })
                .unwrap_or_default();
            same_zone.sort_by_key(|c| (c.manhattan(destination), *c));
            self.land_in_cells(carried, &mut remaining, same_zone, &mut landings)?;
        }

        if remaining > 0 {
            let mut anywhere = self.storage_cells_for(&def);
            anywhere.sort_by_key(|(c, p)| (core::cmp::Reverse(*p), c.manhattan(destination), *c));
            let cells: Vec<Cell> = anywhere.into_iter().map(|(c, _)| c).collect();
            self.land_in_cells(carried, &mut remaining, cells, &mut landings)?;
        }

        if remaining > 0 {
            warn!(%agent, item = %carried, leftover = remaining, "storage full, dropping");
            let dropped = self.drop_near(agent, carried, remaining)?;
            landings.extend(dropped);
        }

        Ok(Placement { landings })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stow_types::{ItemDef, StoragePriority, ThingCategory};

    use super::*;
    use crate::pawn::Pawn;

    fn world() -> (WorldMap, AgentId) {
        let mut map = WorldMap::new(8, 8);
        map.register_def(ItemDef::new(
            "Steel",
            Some(ThingCategory::new(2, "ResourcesRaw")),
            10,
        ))
        .unwrap();
        map.register_def(ItemDef::new("Rock", None, 1)).unwrap();
        let agent = map.add_pawn(Pawn::new("Ada", Cell::new(4, 4)));
        (map, agent)
    }

    #[test]
    fn drop_near_uses_agent_cell_first() {
        let (mut map, agent) = world();
        let steel = map.spawn_in_inventory(agent, "Steel", 7).unwrap();
        let landings = map.drop_near(agent, steel, 7).unwrap();
        assert_eq!(landings.len(), 1);
        let first = landings.first().copied().unwrap();
        assert_eq!(first.cell, Cell::new(4, 4));
        assert_eq!(first.item, steel);
        assert!(map.inventory_items(agent).is_empty());
        assert_eq!(
            map.item(steel).unwrap().whereabouts,
            Whereabouts::Ground(Cell::new(4, 4))
        );
    }

    #[test]
    fn drop_near_spreads_over_cells() {
        let (mut map, agent) = world();
        map.spawn_on_ground("Rock", 1, Cell::new(4, 4)).unwrap();
        let steel = map.spawn_in_inventory(agent, "Steel", 10).unwrap();
        let landings = map.drop_near(agent, steel, 10).unwrap();
        assert!(landings.iter().all(|l| l.cell != Cell::new(4, 4)));
        assert_eq!(landings.iter().map(|l| l.count).sum::<u32>(), 10);
        assert_eq!(map.total_units("Steel"), 10);
    }

    #[test]
    fn place_into_destination() {
        let (mut map, agent) = world();
        map.add_zone("stock", StoragePriority::Normal, &[], [Cell::new(0, 0), Cell::new(1, 0)]);
        let steel = map.spawn_in_inventory(agent, "Steel", 6).unwrap();
        map.transfer_to_carry(agent, steel, 6).unwrap();

        let placement = map.place_carried(agent, Cell::new(0, 0)).unwrap();
        assert!(!placement.redirected_from(Cell::new(0, 0)));
        assert_eq!(placement.total(), 6);
        assert!(placement.landings.iter().all(|l| l.in_storage));
        assert!(map.pawn(agent).unwrap().carried.is_none());
    }

    #[test]
    fn full_destination_falls_back_within_zone() {
        let (mut map, agent) = world();
        map.add_zone("stock", StoragePriority::Normal, &[], [Cell::new(0, 0), Cell::new(1, 0)]);
        map.spawn_on_ground("Steel", 8, Cell::new(0, 0)).unwrap();
        let steel = map.spawn_in_inventory(agent, "Steel", 6).unwrap();
        map.transfer_to_carry(agent, steel, 6).unwrap();

        let placement = map.place_carried(agent, Cell::new(0, 0)).unwrap();
        assert!(placement.redirected_from(Cell::new(0, 0)));
        assert_eq!(map.ground_at(Cell::new(0, 0)).unwrap().stack_count, 10);
        assert_eq!(map.ground_at(Cell::new(1, 0)).unwrap().stack_count, 4);
        assert!(map.pawn(agent).unwrap().carried.is_none());
    }

    #[test]
    fn no_storage_left_drops_near_agent() {
        let (mut map, agent) = world();
        map.add_zone("tiny", StoragePriority::Normal, &[], [Cell::new(0, 0)]);
        map.spawn_on_ground("Rock", 1, Cell::new(0, 0)).unwrap();
        let steel = map.spawn_in_inventory(agent, "Steel", 5).unwrap();
        map.transfer_to_carry(agent, steel, 5).unwrap();

        let placement = map.place_carried(agent, Cell::new(0, 0)).unwrap();
        assert_eq!(placement.total(), 5);
        assert!(placement.landings.iter().all(|l| !l.in_storage));
        assert_eq!(map.total_units("Steel"), 5);
    }

    #[test]
    fn place_without_carry_fails() {
        let (mut map, agent) = world();
        assert!(matches!(
            map.place_carried(agent, Cell::new(0, 0)),
            Err(WorldError::NothingCarried(_))
        ));
    }
}
