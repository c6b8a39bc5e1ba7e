//! Auto-explore queries for AI agents.
//!
//! "Find the nearest cell I have never seen, and path to it" is the whole
//! auto-explore loop: the first half reads the grid's unseen set, the
//! second runs a graph search.

use crate::dungeon::Grid;
use crate::path::{reconstruct_path, Graph, SearchAlgorithm};
use crate::Coord;

/// Find the walkable never-seen cell nearest to `from` by straight-line
/// distance.
///
/// Searches the grid's incrementally maintained unseen set, not the whole
/// grid. Ties break on coordinate order so the answer is deterministic.
/// Returns `None` once everything walkable has been seen.
pub fn find_nearest_unseen(grid: &Grid, from: Coord) -> Option<Coord> {
    grid.unseen_cells()
        .iter()
        .copied()
        .min_by_key(|&(x, y)| {
            let dx = i64::from(x - from.0);
            let dy = i64::from(y - from.1);
            (dx * dx + dy * dy, x, y)
        })
}

/// Search with the chosen algorithm and reconstruct the resulting path.
///
/// The returned coordinates exclude `start`; `None` means no path.
pub fn path(
    graph: &Graph,
    start: Coord,
    goal: Coord,
    algorithm: SearchAlgorithm,
) -> Option<Vec<Coord>> {
    let result = graph.search(start, goal, algorithm)?;
    Some(reconstruct_path(goal, &result.predecessors))
}
