//! Registry of item definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use stow_types::ItemDef;

use crate::error::WorldError;

/// All item defs known to a world, keyed by def name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefRegistry {
    defs: BTreeMap<String, ItemDef>,
}

impl DefRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            defs: BTreeMap::new(),
        }
    }

    /// Register a def.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateDef`] if the name is already taken.
    pub fn register(&mut self, def: ItemDef) -> Result<(), WorldError> {
        if self.defs.contains_key(&def.def_name) {
            return Err(WorldError::DuplicateDef(def.def_name));
        }
        self.defs.insert(def.def_name.clone(), def);
        Ok(())
    }

    /// Look up a def by name.
    pub fn get(&self, def_name: &str) -> Option<&ItemDef> {
        self.defs.get(def_name)
    }

    /// Look up a def by name, failing with [`WorldError::UnknownDef`].
    pub fn require(&self, def_name: &str) -> Result<&ItemDef, WorldError> {
        self.get(def_name)
            .ok_or_else(|| WorldError::UnknownDef(def_name.to_owned()))
    }

    /// Iterate over all defs in name order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemDef> {
        self.defs.values()
    }
}
