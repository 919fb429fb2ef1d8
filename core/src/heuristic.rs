//! Static board evaluation used at the search horizon.
//!
//! The value is a sum of independently weighted terms. Two weight sets are
//! provided: [`HeuristicWeights::classic`] (the earlier tuning, snake anchored
//! bottom-right) and [`HeuristicWeights::refined`] (the default, snake anchored
//! top-left with smoothness and merge terms enabled).

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::board::{tile_value, Board, CELLS, CORNERS};

/// How the empty-cell count is turned into a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyScaling {
    Linear,
    /// `ln(1 + empty)`
    Log,
}

/// Every constant the evaluator uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    pub score_weight: f64,
    pub empty_weight: f64,
    pub empty_scaling: EmptyScaling,
    /// Added when the largest tile sits in a corner.
    pub corner_bonus: f64,
    /// Added (negative) when it does not.
    pub off_corner_penalty: f64,
    /// Positional weight per cell, multiplied by the tile value.
    pub snake_weights: [f64; CELLS],
    pub snake_scale: f64,
    /// Added for every row and column that is monotone.
    pub monotonic_bonus: f64,
    /// Multiplies the summed exponent gaps between neighbours (subtracted).
    pub smoothness_weight: f64,
    /// Added per pair of equal neighbours.
    pub merge_weight: f64,
    /// Added (negative) per large tile found off `snake_path`.
    pub disruptive_penalty: f64,
    /// Tiles within this many exponents of the maximum count as large.
    pub disruptive_window: u8,
    pub snake_path: Vec<usize>,
}

impl HeuristicWeights {
    /// Earlier tuning. The path covers all 16 cells, so the disruption term
    /// never fires with these weights.
    pub fn classic() -> Self {
        HeuristicWeights {
            score_weight: 1.0,
            empty_weight: 500.0,
            empty_scaling: EmptyScaling::Linear,
            corner_bonus: 3000.0,
            off_corner_penalty: -2000.0,
            snake_weights: [
                64.0, 32.0, 16.0, 8.0, //
                128.0, 256.0, 512.0, 1024.0, //
                2048.0, 4096.0, 8192.0, 16384.0, //
                32768.0, 65536.0, 131072.0, 262144.0,
            ],
            snake_scale: 0.00005,
            monotonic_bonus: 500.0,
            smoothness_weight: 0.0,
            merge_weight: 0.0,
            disruptive_penalty: -2000.0,
            disruptive_window: 2,
            snake_path: vec![12, 8, 4, 0, 1, 2, 3, 7, 11, 15, 14, 13, 9, 5, 6, 10],
        }
    }

    /// Default tuning: powers of 4 snaking from the top-left corner.
    pub fn refined() -> Self {
        HeuristicWeights {
            score_weight: 1.0,
            empty_weight: 2700.0,
            empty_scaling: EmptyScaling::Log,
            corner_bonus: 5000.0,
            off_corner_penalty: -2500.0,
            snake_weights: [
                1073741824.0, 268435456.0, 67108864.0, 16777216.0, //
                65536.0, 262144.0, 1048576.0, 4194304.0, //
                16384.0, 4096.0, 1024.0, 256.0, //
                1.0, 4.0, 16.0, 64.0,
            ],
            snake_scale: 1e-9,
            monotonic_bonus: 750.0,
            smoothness_weight: 120.0,
            merge_weight: 400.0,
            disruptive_penalty: -1500.0,
            disruptive_window: 2,
            snake_path: vec![0, 1, 2, 3, 7, 6, 5, 4],
        }
    }
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self::refined()
    }
}

/// Per-term breakdown of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeuristicTerms {
    pub score: f64,
    pub empty: f64,
    pub anchor: f64,
    pub snake: f64,
    pub monotonicity: f64,
    pub smoothness: f64,
    pub merges: f64,
    pub disruption: f64,
}

impl HeuristicTerms {
    pub fn total(&self) -> f64 {
        self.score
            + self.empty
            + self.anchor
            + self.snake
            + self.monotonicity
            + self.smoothness
            + self.merges
            + self.disruption
    }
}

/// Board evaluator parameterized by a weight set.
#[derive(Debug, Clone)]
pub struct Heuristic {
    weights: HeuristicWeights,
    on_path: [bool; CELLS],
}

impl Heuristic {
    pub fn new(weights: HeuristicWeights) -> Self {
        let mut on_path = [false; CELLS];
        for &index in weights.snake_path.iter().filter(|&&i| i < CELLS) {
            on_path[index] = true;
        }
        Heuristic { weights, on_path }
    }

    #[inline]
    pub fn evaluate(&self, board: &Board) -> f64 {
        self.terms(board).total()
    }

    pub fn terms(&self, board: &Board) -> HeuristicTerms {
        let w = &self.weights;
        let cells = board.cells();
        let max = board.max_exponent();

        let empty = board.empty_count() as f64;
        let empty_feature = match w.empty_scaling {
            EmptyScaling::Linear => empty,
            EmptyScaling::Log => empty.ln_1p(),
        };

        let anchor = if CORNERS.iter().any(|&i| cells[i] == max) {
            w.corner_bonus
        } else {
            w.off_corner_penalty
        };

        let snake: f64 = cells
            .iter()
            .zip(w.snake_weights.iter())
            .filter(|(&e, _)| e > 0)
            .map(|(&e, &weight)| tile_value(e) as f64 * weight)
            .sum();

        let threshold = max.saturating_sub(w.disruptive_window);
        let disruptive = cells
            .iter()
            .enumerate()
            .filter(|&(i, &e)| e > 0 && e >= threshold && !self.on_path[i])
            .count();

        HeuristicTerms {
            score: w.score_weight * board.score() as f64,
            empty: w.empty_weight * empty_feature,
            anchor,
            snake: w.snake_scale * snake,
            monotonicity: w.monotonic_bonus * monotone_lines(cells) as f64,
            smoothness: -w.smoothness_weight * roughness(cells) as f64,
            merges: w.merge_weight * merge_pairs(cells) as f64,
            disruption: w.disruptive_penalty * disruptive as f64,
        }
    }
}

impl Default for Heuristic {
    fn default() -> Self {
        Self::new(HeuristicWeights::default())
    }
}

/// Evaluate with the default (refined) weights.
pub fn heuristic(board: &Board) -> f64 {
    static DEFAULT: OnceLock<Heuristic> = OnceLock::new();
    DEFAULT.get_or_init(Heuristic::default).evaluate(board)
}

fn is_monotone(line: [u8; 4]) -> bool {
    line.windows(2).all(|p| p[0] >= p[1]) || line.windows(2).all(|p| p[0] <= p[1])
}

/// Number of rows plus columns that are non-increasing or non-decreasing.
fn monotone_lines(cells: &[u8; CELLS]) -> u32 {
    let mut count = 0;
    for i in 0..4 {
        let row = [cells[i * 4], cells[i * 4 + 1], cells[i * 4 + 2], cells[i * 4 + 3]];
        let col = [cells[i], cells[i + 4], cells[i + 8], cells[i + 12]];
        count += is_monotone(row) as u32 + is_monotone(col) as u32;
    }
    count
}

/// Calls `f` for every horizontally or vertically adjacent pair of cells.
fn for_each_neighbour_pair(cells: &[u8; CELLS], mut f: impl FnMut(u8, u8)) {
    for row in 0..4 {
        for col in 0..4 {
            let here = cells[row * 4 + col];
            if col < 3 {
                f(here, cells[row * 4 + col + 1]);
            }
            if row < 3 {
                f(here, cells[(row + 1) * 4 + col]);
            }
        }
    }
}

fn roughness(cells: &[u8; CELLS]) -> u32 {
    let mut total = 0;
    for_each_neighbour_pair(cells, |a, b| {
        if a > 0 && b > 0 {
            total += a.abs_diff(b) as u32;
        }
    });
    total
}

fn merge_pairs(cells: &[u8; CELLS]) -> u32 {
    let mut pairs = 0;
    for_each_neighbour_pair(cells, |a, b| {
        if a > 0 && a == b {
            pairs += 1;
        }
    });
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn single_tile(index: usize, exponent: u8) -> Board {
        let mut cells = [0u8; 16];
        cells[index] = exponent;
        Board::from_cells(cells)
    }

    #[test]
    fn test_classic_single_tile() {
        let h = Heuristic::new(HeuristicWeights::classic());
        let terms = h.terms(&single_tile(0, 1));
        assert_eq!(terms.score, 0.0);
        assert_eq!(terms.empty, 15.0 * 500.0);
        assert_eq!(terms.anchor, 3000.0);
        assert!((terms.snake - 2.0 * 64.0 * 0.00005).abs() < 1e-12);
        assert_eq!(terms.monotonicity, 8.0 * 500.0);
        assert_eq!(terms.smoothness, 0.0);
        assert_eq!(terms.merges, 0.0);
        assert_eq!(terms.disruption, 0.0);
        assert!((terms.total() - 14500.0064).abs() < 1e-9);
    }

    #[test]
    fn test_classic_disruption_is_inert() {
        let h = Heuristic::new(HeuristicWeights::classic());
        let mut rng = SmallRng::seed_from_u64(4);
        for _ in 0..50 {
            assert_eq!(h.terms(&Board::randomize(&mut rng)).disruption, 0.0);
        }
    }

    #[test]
    fn test_refined_single_tile() {
        let h = Heuristic::new(HeuristicWeights::refined());
        let terms = h.terms(&single_tile(0, 1));
        assert!((terms.empty - 2700.0 * 16f64.ln()).abs() < 1e-9);
        assert_eq!(terms.anchor, 5000.0);
        assert!((terms.snake - 2.0 * 1073741824.0 * 1e-9).abs() < 1e-12);
        assert_eq!(terms.monotonicity, 8.0 * 750.0);
        assert_eq!(terms.disruption, 0.0);
    }

    #[test]
    fn test_score_term_weight_one() {
        let board = Board::new([0; 16], 1234);
        let terms = Heuristic::default().terms(&board);
        assert_eq!(terms.score, 1234.0);
    }

    #[test]
    fn test_anchor_penalty_off_corner() {
        let h = Heuristic::new(HeuristicWeights::refined());
        assert_eq!(h.terms(&single_tile(5, 4)).anchor, -2500.0);
        assert_eq!(h.terms(&single_tile(15, 4)).anchor, 5000.0);
    }

    #[test]
    fn test_smoothness_and_merges() {
        let board = Board::from_cells([1, 1, 3, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        let h = Heuristic::new(HeuristicWeights::refined());
        let terms = h.terms(&board);
        // |1-1| + |1-3| = 2
        assert_eq!(terms.smoothness, -120.0 * 2.0);
        assert_eq!(terms.merges, 400.0);
    }

    #[test]
    fn test_empty_cells_do_not_count_as_neighbours() {
        let board = Board::from_cells([5, 0, 5, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]);
        let terms = Heuristic::default().terms(&board);
        assert_eq!(terms.smoothness, 0.0);
        assert_eq!(terms.merges, 0.0);
    }

    #[test]
    fn test_disruption_penalizes_large_tiles_off_path() {
        let h = Heuristic::new(HeuristicWeights::refined());
        // 10 on the path, 9 and 8 off it, 3 too small to count.
        let mut cells = [0u8; 16];
        cells[0] = 10;
        cells[10] = 9;
        cells[15] = 8;
        cells[12] = 3;
        let terms = h.terms(&Board::from_cells(cells));
        assert_eq!(terms.disruption, -1500.0 * 2.0);
    }

    #[test]
    fn test_symmetric_terms_are_invariant() {
        let h = Heuristic::default();
        let mut rng = SmallRng::seed_from_u64(2024);
        for _ in 0..100 {
            let board = Board::randomize(&mut rng);
            let base = h.terms(&board);
            let variants = [
                board.rotate(1),
                board.rotate(2),
                board.rotate(3),
                board.reflect(),
                board.reflect().rotate(1),
            ];
            for variant in variants {
                let terms = h.terms(&variant);
                assert_eq!(terms.monotonicity, base.monotonicity);
                assert_eq!(terms.smoothness, base.smoothness);
                assert_eq!(terms.merges, base.merges);
                assert_eq!(terms.empty, base.empty);
            }
        }
    }

    #[test]
    fn test_snake_term_is_orientation_sensitive() {
        let h = Heuristic::default();
        let board = single_tile(0, 8);
        assert!(h.terms(&board).snake > h.terms(&board.rotate(2)).snake);
    }

    #[test]
    fn test_heuristic_is_finite() {
        let h_classic = Heuristic::new(HeuristicWeights::classic());
        let mut cells = [0u8; 16];
        cells[0] = 16;
        let boards = [
            Board::EMPTY,
            single_tile(9, 1),
            Board::from_cells(cells),
            Board::from_cells([1, 2, 1, 2, 2, 1, 2, 1, 1, 2, 1, 2, 2, 1, 2, 1]),
        ];
        for board in boards {
            assert!(heuristic(&board).is_finite());
            assert!(h_classic.evaluate(&board).is_finite());
        }
    }

    #[test]
    fn test_default_function_matches_default_evaluator() {
        let board = Board::from_cells([3, 2, 1, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2]);
        assert_eq!(heuristic(&board), Heuristic::default().evaluate(&board));
    }

    #[test]
    fn test_weights_deserialize_with_defaults() {
        let weights: HeuristicWeights =
            serde_json::from_str(r#"{ "merge_weight": 10.0, "empty_scaling": "linear" }"#).unwrap();
        assert_eq!(weights.merge_weight, 10.0);
        assert_eq!(weights.empty_scaling, EmptyScaling::Linear);
        assert_eq!(weights.corner_bonus, HeuristicWeights::refined().corner_bonus);
    }
}
