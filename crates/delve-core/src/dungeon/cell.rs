//! Map cell types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Cell/terrain kind
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum CellKind {
    /// Solid rock; the whole grid starts as wall.
    #[default]
    Wall = 0,
    /// Carved room interior.
    Floor = 1,
    /// Carved corridor connecting rooms.
    Path = 2,
}

impl CellKind {
    /// Check if this kind can be walked on
    pub const fn is_walkable(&self) -> bool {
        matches!(self, CellKind::Floor | CellKind::Path)
    }

    /// Check if this kind blocks line of sight
    pub const fn blocks_sight(&self) -> bool {
        matches!(self, CellKind::Wall)
    }

    /// Get the display character for this cell kind
    pub const fn symbol(&self) -> char {
        match self {
            CellKind::Wall => '#',
            CellKind::Floor => '.',
            CellKind::Path => ',',
        }
    }
}

/// Effective render state of a cell, derived from its visibility flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum RenderState {
    /// In the observer's field of view this turn; drawn lit.
    Illuminated,
    /// Seen at some earlier turn but not currently visible; drawn dimmed.
    Remembered,
    /// Never seen; drawn as a uniform unknown placeholder.
    Unknown,
}

/// A single map cell
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Terrain kind
    pub kind: CellKind,

    /// In the observer's field of view this turn (recomputed every turn)
    #[serde(skip)]
    pub currently_visible: bool,

    /// Has been visible at least once; monotonic, never cleared
    pub ever_seen: bool,
}

impl Cell {
    /// Create a new wall cell
    pub const fn wall() -> Self {
        Self {
            kind: CellKind::Wall,
            currently_visible: false,
            ever_seen: false,
        }
    }

    /// Check if walkable
    pub const fn is_walkable(&self) -> bool {
        self.kind.is_walkable()
    }

    /// Check if this cell blocks line of sight
    pub const fn blocks_sight(&self) -> bool {
        self.kind.blocks_sight()
    }

    /// Effective render state for this turn
    pub const fn render_state(&self) -> RenderState {
        if self.currently_visible {
            RenderState::Illuminated
        } else if self.ever_seen {
            RenderState::Remembered
        } else {
            RenderState::Unknown
        }
    }

    /// Display character, taking the render state into account
    pub const fn glyph(&self) -> char {
        match self.render_state() {
            RenderState::Unknown => ' ',
            _ => self.kind.symbol(),
        }
    }
}
