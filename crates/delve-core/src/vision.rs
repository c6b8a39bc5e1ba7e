//! Field-of-view computation.
//!
//! Ray-marches outward from the observer over a fixed angular sweep,
//! marking every stepped-through cell visible until a wall or the grid
//! edge stops the ray. Visibility is fully re-derived every call; only
//! `ever_seen` accumulates across turns. Recomputing from scratch is a
//! correctness-over-performance choice appropriate to turn-based play.

use std::f64::consts::TAU;

use crate::dungeon::Grid;
use crate::{Coord, CoreError};

/// Number of rays cast over the full circle. One ray per degree is dense
/// enough that no cell within a playable radius falls between rays.
const ANGULAR_SAMPLES: u32 = 360;

/// Recompute the observer's field of view.
///
/// Marks the observer's own cell visible unconditionally, then marches
/// each ray in unit steps up to `radius` cells. A wall cell is itself
/// marked visible but terminates its ray, so cells behind it stay hidden.
/// Every cell marked visible is also flagged `ever_seen`, permanently.
///
/// Returns [`CoreError::OutOfBounds`] when the observer is outside the
/// grid.
pub fn compute_visibility(
    grid: &mut Grid,
    observer: Coord,
    radius: u32,
) -> Result<(), CoreError> {
    let (ox, oy) = observer;
    if !grid.in_bounds(ox, oy) {
        return Err(CoreError::OutOfBounds { x: ox, y: oy });
    }

    grid.clear_visibility();
    grid.mark_visible(ox, oy);

    for sample in 0..ANGULAR_SAMPLES {
        let angle = f64::from(sample) * TAU / f64::from(ANGULAR_SAMPLES);
        let (dy, dx) = angle.sin_cos();

        for step in 1..=radius {
            let distance = f64::from(step);
            let x = (f64::from(ox) + dx * distance).round() as i32;
            let y = (f64::from(oy) + dy * distance).round() as i32;

            if !grid.in_bounds(x, y) {
                break;
            }
            grid.mark_visible(x, y);
            if grid.kind(x, y).is_some_and(|k| k.blocks_sight()) {
                break;
            }
        }
    }

    Ok(())
}
