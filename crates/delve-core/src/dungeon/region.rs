//! Rectangular regions with inclusive corners.
//!
//! A `Region` serves three roles: a BSP partition bound, a room footprint
//! and a corridor footprint. Corners are inclusive, so a single-cell
//! region has `lx == hx` and `ly == hy`.

use serde::{Deserialize, Serialize};

use crate::rng::GameRng;

/// An axis-aligned rectangle of cells, inclusive corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Left x coordinate
    pub lx: i32,
    /// Top y coordinate
    pub ly: i32,
    /// Right x coordinate
    pub hx: i32,
    /// Bottom y coordinate
    pub hy: i32,
}

impl Region {
    /// Create a new region
    pub const fn new(lx: i32, ly: i32, hx: i32, hy: i32) -> Self {
        Self { lx, ly, hx, hy }
    }

    /// Get the width of the region
    pub const fn width(&self) -> i32 {
        if self.hx >= self.lx {
            self.hx - self.lx + 1
        } else {
            0
        }
    }

    /// Get the height of the region
    pub const fn height(&self) -> i32 {
        if self.hy >= self.ly {
            self.hy - self.ly + 1
        } else {
            0
        }
    }

    /// Check if the region is valid (has positive area)
    pub const fn is_valid(&self) -> bool {
        self.hx >= self.lx && self.hy >= self.ly
    }

    /// Check if this region contains a coordinate
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.lx && x <= self.hx && y >= self.ly && y <= self.hy
    }

    /// Check if this region fully contains another
    pub const fn contains_region(&self, other: &Region) -> bool {
        self.lx <= other.lx && self.hx >= other.hx && self.ly <= other.ly && self.hy >= other.hy
    }

    /// Overlap of the x-ranges of two regions, if any
    pub fn x_overlap(&self, other: &Region) -> Option<(i32, i32)> {
        let lo = self.lx.max(other.lx);
        let hi = self.hx.min(other.hx);
        if lo <= hi { Some((lo, hi)) } else { None }
    }

    /// Overlap of the y-ranges of two regions, if any
    pub fn y_overlap(&self, other: &Region) -> Option<(i32, i32)> {
        let lo = self.ly.max(other.ly);
        let hi = self.hy.min(other.hy);
        if lo <= hi { Some((lo, hi)) } else { None }
    }

    /// Pick a uniformly random cell inside the region
    pub fn random_point(&self, rng: &mut GameRng) -> (i32, i32) {
        (
            rng.range(self.lx, self.hx),
            rng.range(self.ly, self.hy),
        )
    }
}
