//! Dungeon model and generation.
//!
//! Contains the grid of cells, rectangular regions, and the BSP generator
//! that carves rooms and corridors into the grid.

mod bsp;
mod cell;
mod grid;
mod region;

pub use bsp::{generate, GenerationParams, NodeId, PartitionNode, Tree};
pub use cell::{Cell, CellKind, RenderState};
pub use grid::Grid;
pub use region::Region;
