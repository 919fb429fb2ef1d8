//! Time-bounded iterative-deepening expectimax.
//!
//! Max plies enumerate the player's board-changing actions in the configured
//! move order; chance plies enumerate every spawn outcome weighted by its
//! probability. Every node polls the [`Deadline`]. Once it has passed, nodes
//! return `None`, which propagates to the root and discards the whole
//! in-progress depth, so a committed answer always comes from a fully
//! searched depth.

use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::action::Action;
use crate::board::Board;
use crate::config::{AgentConfig, SearchConfig};
use crate::error::Result;
use crate::heuristic::Heuristic;

// =============================================================================
// Types
// =============================================================================

/// Which side moves at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ply {
    Max,
    Chance,
}

/// Wall-clock limit for one decision.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    #[inline]
    pub fn expired(&self) -> bool {
        self.start.elapsed() >= self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Counters accumulated across decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchStats {
    pub decisions: u64,
    /// Every node visited, including ones cut off by the deadline.
    pub nodes: u64,
    /// Nodes whose children were generated.
    pub expanded: u64,
    pub children: u64,
    /// Sum of the deepest completed depth over all decisions.
    pub depth_total: u64,
    /// Decisions where not even depth 1 completed.
    pub timeouts: u64,
}

impl SearchStats {
    pub fn average_depth(&self) -> f64 {
        if self.decisions == 0 {
            0.0
        } else {
            self.depth_total as f64 / self.decisions as f64
        }
    }

    pub fn branching_factor(&self) -> f64 {
        if self.expanded == 0 {
            0.0
        } else {
            self.children as f64 / self.expanded as f64
        }
    }
}

// =============================================================================
// Expectimax Solver
// =============================================================================

pub struct Expectimax {
    config: SearchConfig,
    heuristic: Heuristic,
    stats: SearchStats,
    recommendation: Option<Action>,
    completed_depth: u32,
}

impl Expectimax {
    pub fn new() -> Self {
        Self::from_parts(AgentConfig::default())
    }

    /// Build a searcher from `config`, rejecting a move order that is not a
    /// permutation and any zero depth cap.
    pub fn with_config(config: AgentConfig) -> Result<Self> {
        config.search.validate()?;
        Ok(Self::from_parts(config))
    }

    fn from_parts(config: AgentConfig) -> Self {
        Self {
            config: config.search,
            heuristic: Heuristic::new(config.heuristic),
            stats: SearchStats::default(),
            recommendation: None,
            completed_depth: 0,
        }
    }

    /// Action committed by the last decision, if any depth completed.
    pub fn recommendation(&self) -> Option<Action> {
        self.recommendation
    }

    /// Deepest depth fully searched by the last decision (0 if none).
    pub fn completed_depth(&self) -> u32 {
        self.completed_depth
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SearchStats::default();
    }

    /// Pick a move for `board` within `budget` by iterative deepening.
    ///
    /// Returns `None` when the board has no legal action or when the budget
    /// expires before depth 1 completes.
    pub fn decide(&mut self, board: &Board, budget: Duration) -> Option<Action> {
        let deadline = Deadline::new(budget);
        self.recommendation = None;
        self.completed_depth = 0;
        self.stats.decisions += 1;

        if board.legal_actions().is_empty() {
            debug!("no legal action, nothing to search");
            return None;
        }

        let max_depth = self.config.depth_cap.max_depth(board);
        let mut depth = 1;
        while !deadline.expired() && max_depth.map_or(true, |max| depth <= max) {
            match self.search_root(board, depth, &deadline) {
                Some((action, value)) => {
                    self.recommendation = Some(action);
                    self.completed_depth = depth;
                    debug!(
                        "depth {depth}: best {action} value {value:.1} after {:?}",
                        deadline.elapsed()
                    );
                }
                None => {
                    debug!("depth {depth} abandoned at the deadline");
                    break;
                }
            }
            depth += 1;
        }

        self.stats.depth_total += self.completed_depth as u64;
        if self.completed_depth == 0 {
            self.stats.timeouts += 1;
            warn!("search budget of {budget:?} expired before depth 1 completed");
        }
        self.recommendation
    }

    /// Best root action and its value at exactly `depth`, or `None` if the
    /// budget runs out (or nothing is legal).
    pub fn best_at_depth(
        &mut self,
        board: &Board,
        depth: u32,
        budget: Duration,
    ) -> Option<(Action, f64)> {
        let deadline = Deadline::new(budget);
        self.search_root(board, depth.max(1), &deadline)
    }

    /// Value of `board` entered as a `ply` node with `depth` plies remaining.
    pub fn value(&mut self, board: &Board, ply: Ply, depth: u32, budget: Duration) -> Option<f64> {
        let deadline = Deadline::new(budget);
        match ply {
            Ply::Max => self.max_value(board, depth, &deadline),
            Ply::Chance => self.chance_value(board, depth, &deadline),
        }
    }

    fn search_root(&mut self, board: &Board, depth: u32, deadline: &Deadline) -> Option<(Action, f64)> {
        self.stats.nodes += 1;
        self.stats.expanded += 1;

        let order = self.config.move_order;
        let mut best: Option<(Action, f64)> = None;
        for action in order {
            if deadline.expired() {
                return None;
            }
            let (moved, _) = board.apply_move(action);
            if moved.same_tiles(board) {
                continue;
            }
            self.stats.children += 1;
            let value = self.chance_value(&moved, depth - 1, deadline)?;
            if best.map_or(true, |(_, best_value)| value > best_value) {
                best = Some((action, value));
            }
        }
        best
    }

    fn max_value(&mut self, board: &Board, depth: u32, deadline: &Deadline) -> Option<f64> {
        self.stats.nodes += 1;
        if deadline.expired() {
            return None;
        }
        if board.is_terminal() {
            return Some(board.score() as f64);
        }
        if depth == 0 {
            return Some(self.heuristic.evaluate(board));
        }

        self.stats.expanded += 1;
        let order = self.config.move_order;
        let mut best = f64::NEG_INFINITY;
        for action in order {
            let (moved, _) = board.apply_move(action);
            if moved.same_tiles(board) {
                continue;
            }
            self.stats.children += 1;
            best = best.max(self.chance_value(&moved, depth - 1, deadline)?);
        }
        Some(best)
    }

    fn chance_value(&mut self, board: &Board, depth: u32, deadline: &Deadline) -> Option<f64> {
        self.stats.nodes += 1;
        if deadline.expired() {
            return None;
        }
        if board.is_terminal() {
            return Some(board.score() as f64);
        }
        if depth == 0 {
            return Some(self.heuristic.evaluate(board));
        }

        let spawns = board.possible_spawns();
        if spawns.is_empty() {
            return Some(self.heuristic.evaluate(board));
        }

        self.stats.expanded += 1;
        let mut expected = 0.0;
        for spawn in spawns {
            let child = match board.add_tile(spawn.index, spawn.exponent) {
                Ok(child) => child,
                Err(err) => unreachable!("spawn outcomes only name empty cells: {err}"),
            };
            self.stats.children += 1;
            expected += spawn.probability * self.max_value(&child, depth - 1, deadline)?;
        }
        Some(expected)
    }
}

impl Default for Expectimax {
    fn default() -> Self {
        Self::new()
    }
}
