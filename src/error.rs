//! Crate-wide error type, via `thiserror`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HdaError {
    #[error("unknown grid type `{0}` (expected one of: empty, walls, maze)")]
    UnknownGridType(String),

    #[error("grid must be at least 3x3, got {width}x{height}")]
    GridTooSmall { width: i32, height: i32 },

    #[error("the goal cell is a wall; no path can exist")]
    GoalOnWall,
}
