//! The player contract and its implementations.
//!
//! A player is asked for a move given a board and a time budget; it answers
//! with at most one action and remembers its last answer.

use std::time::Duration;

use log::trace;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::action::Action;
use crate::board::Board;
use crate::search::{Expectimax, SearchStats};

pub trait Player {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// Choose a move for `board` within `budget`. `None` means no move was
    /// produced (no legal action, or the budget ran out first).
    fn decide(&mut self, board: &Board, budget: Duration) -> Option<Action>;

    /// The answer given by the last call to [`Player::decide`].
    fn last_move(&self) -> Option<Action>;

    /// Search counters, for players that search.
    fn stats(&self) -> Option<SearchStats> {
        None
    }
}

impl Player for Expectimax {
    fn name(&self) -> &str {
        "expectimax"
    }

    fn decide(&mut self, board: &Board, budget: Duration) -> Option<Action> {
        Expectimax::decide(self, board, budget)
    }

    fn last_move(&self) -> Option<Action> {
        self.recommendation()
    }

    fn stats(&self) -> Option<SearchStats> {
        Some(Expectimax::stats(self))
    }
}

/// One-ply player: takes the legal move with the largest immediate merge score.
#[derive(Debug, Default)]
pub struct Greedy {
    last: Option<Action>,
}

impl Greedy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Player for Greedy {
    fn name(&self) -> &str {
        "greedy"
    }

    fn decide(&mut self, board: &Board, _budget: Duration) -> Option<Action> {
        let mut best: Option<(Action, u64)> = None;
        for action in board.legal_actions() {
            let (_, delta) = board.apply_move(action);
            trace!("greedy: {action} scores {delta}");
            if best.map_or(true, |(_, best_delta)| delta > best_delta) {
                best = Some((action, delta));
            }
        }
        self.last = best.map(|(action, _)| action);
        self.last
    }

    fn last_move(&self) -> Option<Action> {
        self.last
    }
}

/// Uniformly random legal moves from a seeded generator.
#[derive(Debug)]
pub struct RandomPlayer {
    rng: SmallRng,
    last: Option<Action>,
}

impl RandomPlayer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            last: None,
        }
    }
}

impl Player for RandomPlayer {
    fn name(&self) -> &str {
        "random"
    }

    fn decide(&mut self, board: &Board, _budget: Duration) -> Option<Action> {
        let legal = board.legal_actions();
        self.last = if legal.is_empty() {
            None
        } else {
            Some(legal[self.rng.gen_range(0..legal.len())])
        };
        self.last
    }

    fn last_move(&self) -> Option<Action> {
        self.last
    }
}
