//! Error type shared by the board engine and the players.

/// Errors raised when a caller breaks the engine's contract.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid action: {0:?} (expected one of U, D, L, R or 0-3)")]
    InvalidAction(String),
    #[error("cell {index} is not empty")]
    OccupiedCell { index: usize },
    #[error("cell index {index} is out of range (0-15)")]
    CellOutOfRange { index: usize },
    #[error("cannot place a tile with exponent {exponent}")]
    InvalidExponent { exponent: u8 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, GameError>;
