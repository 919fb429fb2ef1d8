//! # 2048 Engine and Expectimax Player
//!
//! A pure Rust implementation of the 2048 board rules together with a
//! time-bounded, iterative-deepening expectimax player.
//!
//! - [`Board`]: immutable 4x4 value (exponent per cell, plus score) with move,
//!   spawn and symmetry primitives.
//! - [`Expectimax`]: anytime search that commits the best move of the deepest
//!   fully searched depth before the budget expires.
//! - [`Heuristic`]: weighted evaluation used at the search horizon.
//! - [`Player`]: the common contract shared by the expectimax, greedy and
//!   random players.
//! - [`Game`]: a seeded game session for simulations.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use tile2048_core::{Expectimax, Game, Player};
//!
//! let mut game = Game::new(42);
//! let mut player = Expectimax::new();
//! if let Some(action) = player.decide(game.board(), Duration::from_millis(50)) {
//!     let result = game.step(action);
//!     assert!(result.changed);
//! }
//! ```

use rand::rngs::SmallRng;
use rand::SeedableRng;

pub mod action;
pub mod board;
pub mod config;
pub mod error;
pub mod heuristic;
pub mod player;
pub mod search;

pub use action::Action;
pub use board::{Board, SpawnOutcome, SUPER_WIN_EXPONENT};
pub use config::{AgentConfig, DepthCap, SearchConfig};
pub use error::{GameError, Result};
pub use heuristic::{heuristic, Heuristic, HeuristicTerms, HeuristicWeights};
pub use player::{Greedy, Player, RandomPlayer};
pub use search::{Deadline, Expectimax, Ply, SearchStats};

/// Result of executing a step (move) in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    /// Whether the board changed (and a new tile was spawned).
    pub changed: bool,
    /// Points earned from merges in this move.
    pub reward: u64,
    /// Whether the game is over.
    pub done: bool,
}

/// A game session: the current board plus the generator used for spawns.
#[derive(Clone)]
pub struct Game {
    board: Board,
    rng: SmallRng,
    done: bool,
}

impl Game {
    /// Create a new game with the given seed.
    ///
    /// The game starts with two random tiles (90% chance of 2, 10% chance of 4).
    pub fn new(seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let board = Board::initial(&mut rng);
        Game {
            done: board.is_terminal(),
            board,
            rng,
        }
    }

    /// Start from an arbitrary board; `seed` drives later spawns.
    pub fn from_board(board: Board, seed: u64) -> Self {
        Game {
            done: board.is_terminal(),
            board,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Reset the game to initial state with a new seed.
    pub fn reset(&mut self, seed: u64) {
        *self = Game::new(seed);
    }

    /// Execute a move in the given direction.
    ///
    /// If the move doesn't change the board, no tile is spawned.
    pub fn step(&mut self, action: Action) -> StepResult {
        if self.done {
            return StepResult {
                changed: false,
                reward: 0,
                done: true,
            };
        }

        let (next, reward) = self.board.result(action, &mut self.rng);
        let changed = !next.same_tiles(&self.board);
        self.board = next;
        self.done = self.board.is_terminal();

        StepResult {
            changed,
            reward,
            done: self.done,
        }
    }

    /// Check if the game is over (no legal move, or a super-win tile).
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn score(&self) -> u64 {
        self.board.score()
    }

    /// Get the maximum tile value on the board.
    pub fn max_tile(&self) -> u64 {
        self.board.max_tile()
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Game {{ done: {}, board: {:?} }}", self.done, self.board)
    }
}

impl std::fmt::Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board)
    }
}

// =============================================================================
// Tests
// =============================================================================
