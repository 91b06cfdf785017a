//! Reconciles an agent's tracked carry set against its physical inventory.
//!
//! Tracked handles go stale when the stack they point at is merged into
//! another stack. The reconciler walks the set in a deterministic order and
//! repairs it lazily: clean entries are returned as-is, stale entries are
//! removed and replaced by a same-def inventory stack ("straggler") when one
//! exists.

use stow_types::{AgentId, ItemId, UnloadEvent};
use stow_world::{WorldError, WorldMap};
use tracing::{debug, warn};

/// An item and how many of its units to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThingCount {
    /// The inventory stack to unload.
    pub item: ItemId,
    /// Units to move (the full stack at selection time).
    pub count: u32,
}

/// Sort key of a tracked entry: category index (uncategorized first), then
/// def name, then handle.
pub type EntryKey = (Option<u32>, String, ItemId);

/// Picks the next tracked item to unload.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarriedSurplusReconciler;

impl CarriedSurplusReconciler {
    /// Tracked entries of `agent` in unload order.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::AgentNotFound`] if the agent does not exist.
    pub fn unload_order(world: &WorldMap, agent: AgentId) -> Result<Vec<EntryKey>, WorldError> {
        let pawn = world.require_pawn(agent)?;
        let mut entries: Vec<EntryKey> = pawn
            .hauled
            .iter()
            .map(|(id, def_name)| {
                let category = world
                    .defs()
                    .get(def_name)
                    .and_then(stow_types::ItemDef::category_index);
                (category, def_name.to_owned(), id)
            })
            .collect();
        entries.sort();
        Ok(entries)
    }

    /// Return the first unloadable item, repairing stale entries on the way.
    ///
    /// Stale entries visited before the returned item are removed from the
    /// set and reported in `journal`. Returns `None` once nothing tracked is
    /// left in the inventory.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::AgentNotFound`] if the agent does not exist.
    pub fn first_unloadable(
        world: &mut WorldMap,
        agent: AgentId,
        journal: &mut Vec<UnloadEvent>,
    ) -> Result<Option<ThingCount>, WorldError> {
        for (_, def_name, id) in Self::unload_order(world, agent)? {
            if world.inventory_contains(agent, id) {
                let count = world.require_item(id)?.stack_count;
                debug!(%agent, item = %id, def = %def_name, count, "tracked item still held");
                return Ok(Some(ThingCount { item: id, count }));
            }

            let straggler = world
                .inventory_items(agent)
                .iter()
                .copied()
                .find(|s| world.item(*s).is_some_and(|i| i.def_name == def_name));

            if let Some(pawn) = world.pawn_mut(agent) {
                pawn.hauled.remove(id);
            }

            if let Some(straggler) = straggler {
                let count = world.require_item(straggler)?.stack_count;
                warn!(
                    %agent,
                    stale = %id,
                    %straggler,
                    def = %def_name,
                    "stale tracked item, unloading straggler"
                );
                journal.push(UnloadEvent::StragglerSubstituted {
                    stale: id,
                    straggler,
                });
                return Ok(Some(ThingCount {
                    item: straggler,
                    count,
                }));
            }

            warn!(%agent, stale = %id, def = %def_name, "stale tracked item dropped from set");
            journal.push(UnloadEvent::StaleEntryRemoved { stale: id });
        }
        Ok(None)
    }
}
