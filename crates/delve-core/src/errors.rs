//! Error types for the map core.
//!
//! All conditions here are local and recoverable; nothing in this crate
//! aborts the process. "No path" and "nothing left unseen" are `None`,
//! not errors.

use thiserror::Error;

/// Errors reported by generation and visibility queries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Generation parameters that cannot produce a valid map are rejected
    /// before any carving happens.
    #[error("invalid generation parameters: {reason}")]
    InvalidParams { reason: String },

    /// Coordinate queries outside the grid are reported, never silently
    /// answered with `false`, to avoid masking caller bugs.
    #[error("coordinate ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },
}
