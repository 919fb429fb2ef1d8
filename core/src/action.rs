use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// The four possible move directions in 2048.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Action {
    /// All four actions in canonical order (Up, Down, Left, Right).
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// Get all four actions.
    pub fn all() -> [Action; 4] {
        Self::ALL
    }

    /// Single-letter token used in logs and on the command line.
    pub fn token(self) -> char {
        match self {
            Action::Up => 'U',
            Action::Down => 'D',
            Action::Left => 'L',
            Action::Right => 'R',
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = GameError;

    /// Convert a u8 to an Action (0=Up, 1=Down, 2=Left, 3=Right).
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Action::Up),
            1 => Ok(Action::Down),
            2 => Ok(Action::Left),
            3 => Ok(Action::Right),
            other => Err(GameError::InvalidAction(other.to_string())),
        }
    }
}

impl TryFrom<char> for Action {
    type Error = GameError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase() {
            'U' => Ok(Action::Up),
            'D' => Ok(Action::Down),
            'L' => Ok(Action::Left),
            'R' => Ok(Action::Right),
            other => Err(GameError::InvalidAction(other.to_string())),
        }
    }
}

impl FromStr for Action {
    type Err = GameError;

    /// Accepts single-letter tokens (`U`, `d`, ...) and full names (`left`, `Right`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Action::try_from(c).map_err(|_| GameError::InvalidAction(s.to_string()));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "up" => Ok(Action::Up),
            "down" => Ok(Action::Down),
            "left" => Ok(Action::Left),
            "right" => Ok(Action::Right),
            _ => Err(GameError::InvalidAction(s.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}
