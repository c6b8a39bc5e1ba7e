//! delve-core: dungeon generation, pathfinding and field-of-view.
//!
//! This crate contains the map logic with no I/O dependencies. It is
//! designed to be pure and testable: the renderer, input handling and
//! game loop live elsewhere and only ever
//! 1. request a generated map ([`dungeon::generate`]),
//! 2. request paths between two cells ([`path::Graph`]),
//! 3. request/read visibility state ([`vision::compute_visibility`]).
//!
//! All randomness flows through [`GameRng`], so a fixed seed reproduces
//! the same dungeon.

pub mod dungeon;
pub mod explore;
pub mod path;
pub mod vision;

mod errors;
mod rng;

pub use errors::CoreError;
pub use rng::GameRng;

/// Grid coordinate, `(x, y)`.
pub type Coord = (i32, i32);
