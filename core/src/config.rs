//! Tunable knobs for the expectimax player. Everything here can be loaded from
//! JSON; missing fields fall back to the defaults.

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::board::Board;
use crate::error::{GameError, Result};
use crate::heuristic::HeuristicWeights;

/// Upper bound on iterative deepening for one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthCap {
    /// Deepen until the time budget runs out.
    Unbounded,
    Fixed(u32),
    /// `shallow` when fewer than `sparse_empty` cells are empty, else `deep`.
    Adaptive {
        sparse_empty: usize,
        shallow: u32,
        deep: u32,
    },
}

impl DepthCap {
    pub fn max_depth(&self, board: &Board) -> Option<u32> {
        match *self {
            DepthCap::Unbounded => None,
            DepthCap::Fixed(depth) => Some(depth),
            DepthCap::Adaptive {
                sparse_empty,
                shallow,
                deep,
            } => {
                if board.empty_count() < sparse_empty {
                    Some(shallow)
                } else {
                    Some(deep)
                }
            }
        }
    }
}

impl Default for DepthCap {
    fn default() -> Self {
        DepthCap::Adaptive {
            sparse_empty: 4,
            shallow: 3,
            deep: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Order in which actions are tried; earlier actions win ties.
    pub move_order: [Action; 4],
    pub depth_cap: DepthCap,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            move_order: [Action::Down, Action::Left, Action::Up, Action::Right],
            depth_cap: DepthCap::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        for action in Action::ALL {
            if !self.move_order.contains(&action) {
                return Err(GameError::InvalidConfig(format!(
                    "move_order must contain every action, missing {action}"
                )));
            }
        }
        let zero_depth = match self.depth_cap {
            DepthCap::Unbounded => false,
            DepthCap::Fixed(depth) => depth == 0,
            DepthCap::Adaptive { shallow, deep, .. } => shallow == 0 || deep == 0,
        };
        if zero_depth {
            return Err(GameError::InvalidConfig(
                "depth cap must allow at least depth 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Search settings plus the evaluation weights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub search: SearchConfig,
    pub heuristic: HeuristicWeights,
}

impl AgentConfig {
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
