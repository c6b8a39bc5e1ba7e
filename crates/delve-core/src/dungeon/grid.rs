//! Grid of map cells plus visibility bookkeeping.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use super::{Cell, CellKind, RenderState};
use crate::{Coord, CoreError};

/// Rectangular array of cells with fixed dimensions.
///
/// The border is always wall: the generator never carves the outermost
/// row or column, so no agent can path off-map.
///
/// The grid also tracks `unseen`, the set of walkable cells that have
/// never been in the observer's field of view. It is maintained
/// incrementally as cells are carved and seen; queries never scan the
/// whole grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    /// Cells indexed `[x][y]`
    cells: Vec<Vec<Cell>>,
    /// Walkable cells never yet seen
    unseen: HashSet<Coord>,
}

impl Grid {
    /// Create a grid filled entirely with wall
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![vec![Cell::wall(); height]; width],
            unseen: HashSet::new(),
        }
    }

    /// Grid width in cells
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    pub fn height(&self) -> usize {
        self.height
    }

    /// Check if a coordinate is inside the grid
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Get cell at position, if in bounds
    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(&self.cells[x as usize][y as usize])
    }

    /// Terrain kind at position, if in bounds
    pub fn kind(&self, x: i32, y: i32) -> Option<CellKind> {
        self.cell(x, y).map(|c| c.kind)
    }

    /// Check if position is walkable (false when out of bounds)
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).is_some_and(|c| c.is_walkable())
    }

    /// Set the terrain kind of a cell, keeping the unseen set in sync.
    /// Out-of-bounds coordinates are ignored.
    pub fn set_kind(&mut self, x: i32, y: i32, kind: CellKind) {
        if !self.in_bounds(x, y) {
            return;
        }
        let cell = &mut self.cells[x as usize][y as usize];
        cell.kind = kind;
        if kind.is_walkable() && !cell.ever_seen {
            self.unseen.insert((x, y));
        } else {
            self.unseen.remove(&(x, y));
        }
    }

    /// Carve a cell during generation.
    ///
    /// Unlike [`Grid::set_kind`] this never overwrites an already-carved
    /// cell with `Path`: corridors dig through wall but pass over existing
    /// floor.
    pub(crate) fn carve(&mut self, x: i32, y: i32, kind: CellKind) {
        if kind == CellKind::Path
            && self.cell(x, y).is_some_and(|c| c.kind != CellKind::Wall)
        {
            return;
        }
        self.set_kind(x, y, kind);
    }

    /// Clear the transient visibility flags before recomputing a turn
    pub(crate) fn clear_visibility(&mut self) {
        for col in &mut self.cells {
            for cell in col {
                cell.currently_visible = false;
            }
        }
    }

    /// Mark a cell visible this turn; sets `ever_seen` permanently
    pub(crate) fn mark_visible(&mut self, x: i32, y: i32) {
        if !self.in_bounds(x, y) {
            return;
        }
        let cell = &mut self.cells[x as usize][y as usize];
        cell.currently_visible = true;
        cell.ever_seen = true;
        self.unseen.remove(&(x, y));
    }

    /// Check if a cell is in the observer's field of view this turn
    pub fn check_if_in_fov(&self, x: i32, y: i32) -> Result<bool, CoreError> {
        self.cell(x, y)
            .map(|c| c.currently_visible)
            .ok_or(CoreError::OutOfBounds { x, y })
    }

    /// Check if a cell has ever been seen
    pub fn is_seen(&self, x: i32, y: i32) -> Result<bool, CoreError> {
        self.cell(x, y)
            .map(|c| c.ever_seen)
            .ok_or(CoreError::OutOfBounds { x, y })
    }

    /// Effective render state of a cell this turn
    pub fn render_state(&self, x: i32, y: i32) -> Result<RenderState, CoreError> {
        self.cell(x, y)
            .map(|c| c.render_state())
            .ok_or(CoreError::OutOfBounds { x, y })
    }

    /// Walkable cells that have never been seen
    pub fn unseen_cells(&self) -> &HashSet<Coord> {
        &self.unseen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_all_wall() {
        let grid = Grid::new(8, 6);
        for x in 0..8 {
            for y in 0..6 {
                assert_eq!(grid.kind(x, y), Some(CellKind::Wall));
            }
        }
        assert!(grid.unseen_cells().is_empty());
    }

    #[test]
    fn test_carve_tracks_unseen() {
        let mut grid = Grid::new(8, 6);
        grid.carve(2, 2, CellKind::Floor);
        grid.carve(3, 2, CellKind::Path);
        assert_eq!(grid.unseen_cells().len(), 2);

        grid.mark_visible(2, 2);
        assert_eq!(grid.unseen_cells().len(), 1);
        assert!(!grid.unseen_cells().contains(&(2, 2)));
    }

    #[test]
    fn test_path_does_not_overwrite_floor() {
        let mut grid = Grid::new(8, 6);
        grid.carve(2, 2, CellKind::Floor);
        grid.carve(2, 2, CellKind::Path);
        assert_eq!(grid.kind(2, 2), Some(CellKind::Floor));
    }

    #[test]
    fn test_out_of_bounds_query_is_an_error() {
        let grid = Grid::new(8, 6);
        assert_eq!(
            grid.check_if_in_fov(8, 0),
            Err(CoreError::OutOfBounds { x: 8, y: 0 })
        );
        assert_eq!(
            grid.is_seen(-1, 3),
            Err(CoreError::OutOfBounds { x: -1, y: 3 })
        );
        assert!(grid.check_if_in_fov(0, 0).is_ok());
    }

    #[test]
    fn test_visibility_flags_reset_but_seen_persists() {
        let mut grid = Grid::new(8, 6);
        grid.carve(2, 2, CellKind::Floor);
        grid.mark_visible(2, 2);
        assert!(grid.check_if_in_fov(2, 2).unwrap());

        grid.clear_visibility();
        assert!(!grid.check_if_in_fov(2, 2).unwrap());
        assert!(grid.is_seen(2, 2).unwrap());
        assert_eq!(grid.render_state(2, 2).unwrap(), RenderState::Remembered);
    }
}
