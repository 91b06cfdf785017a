//! Core value types: grid cells, item categories, and item definitions.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A grid cell coordinate.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Cell {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Cell {
    /// Create a cell at `(x, y)`.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another cell, saturating at `u32::MAX`.
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    /// Whether `other` is this cell or one of its eight neighbours.
    pub const fn touches(self, other: Self) -> bool {
        self.x.abs_diff(other.x) <= 1 && self.y.abs_diff(other.y) <= 1
    }

    /// Cells at exactly Chebyshev distance `radius`, in a stable order.
    ///
    /// Radius 0 yields the cell itself. Used for spiral searches that
    /// expand ring by ring.
    pub fn ring(self, radius: i32) -> Vec<Self> {
        if radius <= 0 {
            return vec![self];
        }
        let mut out = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx.abs() != radius && dy.abs() != radius {
                    continue;
                }
                if let (Some(x), Some(y)) = (self.x.checked_add(dx), self.y.checked_add(dy)) {
                    out.push(Self::new(x, y));
                }
            }
        }
        out
    }
}

impl core::fmt::Display for Cell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// Item definitions
// ---------------------------------------------------------------------------

/// The first display category of an item def.
///
/// `index` gives the category's position in the category tree and is the
/// primary sort key when an agent decides what to unload next.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThingCategory {
    /// Position in the category tree.
    pub index: u32,
    /// Display name.
    pub name: String,
}

impl ThingCategory {
    /// Create a category.
    pub fn new(index: u32, name: &str) -> Self {
        Self {
            index,
            name: name.to_owned(),
        }
    }
}

/// Static definition of an item type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Unique def name; also the stable secondary sort key.
    pub def_name: String,
    /// First display category, if the def has one.
    pub category: Option<ThingCategory>,
    /// Maximum units in one stack (at least 1).
    pub stack_limit: u32,
    /// Whether the item can ever be put into storage.
    pub ever_storable: bool,
}

impl ItemDef {
    /// Create a storable def with the given category and stack limit.
    pub fn new(def_name: &str, category: Option<ThingCategory>, stack_limit: u32) -> Self {
        Self {
            def_name: def_name.to_owned(),
            category,
            stack_limit: stack_limit.max(1),
            ever_storable: true,
        }
    }

    /// Mark this def as never storable.
    #[must_use]
    pub const fn never_storable(mut self) -> Self {
        self.ever_storable = false;
        self
    }

    /// Category index used for ordering, `None` when uncategorized.
    pub fn category_index(&self) -> Option<u32> {
        self.category.as_ref().map(|c| c.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_is_symmetric() {
        let a = Cell::new(1, 2);
        let b = Cell::new(-3, 5);
        assert_eq!(a.manhattan(b), 7);
        assert_eq!(b.manhattan(a), 7);
    }

    #[test]
    fn ring_sizes() {
        let c = Cell::new(0, 0);
        assert_eq!(c.ring(0), vec![c]);
        assert_eq!(c.ring(1).len(), 8);
        assert_eq!(c.ring(2).len(), 16);
    }

    #[test]
    fn touches_includes_diagonals() {
        let c = Cell::new(4, 4);
        assert!(c.touches(Cell::new(5, 5)));
        assert!(c.touches(c));
        assert!(!c.touches(Cell::new(6, 4)));
    }

    #[test]
    fn stack_limit_is_at_least_one() {
        let def = ItemDef::new("Rock", None, 0);
        assert_eq!(def.stack_limit, 1);
        assert!(def.ever_storable);
        assert!(!def.never_storable().ever_storable);
    }
}
