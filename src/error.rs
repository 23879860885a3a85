//! Error types shared by the grid engine, the scheduler's game actors and the scene.

use thiserror::Error;

/// Core game error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid {name}: {value}")]
    InvalidDimension { name: &'static str, value: i64 },

    #[error("cell [{column}, {row}] is outside of {columns}x{rows}")]
    OutOfRange {
        column: i32,
        row: i32,
        columns: usize,
        rows: usize,
    },

    #[error("cell [{column}, {row}] is not vacant")]
    Occupied { column: i32, row: i32 },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, GameError>;
