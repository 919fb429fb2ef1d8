//! Immutable 4x4 board value and the move/spawn primitives.
//!
//! Cells are stored in row-major order (indices 0-3 are row 0, 4-7 are row 1,
//! etc.). Each cell holds an exponent: 0 is empty, `e` is a tile of value `2^e`.
//! Every transition returns a new `Board`; nothing is mutated in place.

use std::fmt;
use std::hash::{Hash, Hasher};

use rand::Rng;

use crate::action::Action;
use crate::error::{GameError, Result};

/// Number of cells on the board.
pub const CELLS: usize = 16;

/// A board holding a tile of at least this exponent (65536) is terminal.
pub const SUPER_WIN_EXPONENT: u8 = 16;

/// Probability that a spawned tile is a 2 (exponent 1); otherwise a 4.
pub const SPAWN_TWO_PROBABILITY: f64 = 0.9;

/// Corner cell indices.
pub const CORNERS: [usize; 4] = [0, 3, 12, 15];

/// Value of a tile with the given exponent (0 for an empty cell).
#[inline]
pub fn tile_value(exponent: u8) -> u64 {
    if exponent == 0 {
        0
    } else {
        1u64.checked_shl(exponent as u32).unwrap_or(u64::MAX)
    }
}

/// One possible result of nature's spawn: a tile of `exponent` placed at
/// `index` with the given probability. Probabilities over all outcomes of a
/// board sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnOutcome {
    pub index: usize,
    pub exponent: u8,
    pub probability: f64,
}

/// The 2048 board: 16 exponent cells plus the score accumulated so far.
///
/// Equality and hashing look at the cells only; two boards with the same grid
/// are the same position whatever score reached them.
#[derive(Clone, Copy, Default)]
pub struct Board {
    cells: [u8; CELLS],
    score: u64,
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
    }
}

impl Eq for Board {}

impl Hash for Board {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cells.hash(state);
    }
}

impl Board {
    pub const EMPTY: Board = Board {
        cells: [0; CELLS],
        score: 0,
    };

    pub fn new(cells: [u8; CELLS], score: u64) -> Self {
        Board { cells, score }
    }

    /// Board with the given cells and a score of zero.
    pub fn from_cells(cells: [u8; CELLS]) -> Self {
        Board { cells, score: 0 }
    }

    /// Empty board seeded with two random tiles.
    pub fn initial<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Board::EMPTY.spawn_random(rng).spawn_random(rng)
    }

    /// Fill every cell independently, drawing exponents 0, 1, 2, 3 with
    /// weights 16:4:2:1. Produces varied start positions for simulations.
    pub fn randomize<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cells = [0u8; CELLS];
        for cell in cells.iter_mut() {
            *cell = match rng.gen_range(0..23u8) {
                0..=15 => 0,
                16..=19 => 1,
                20..=21 => 2,
                _ => 3,
            };
        }
        Board::from_cells(cells)
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn cells(&self) -> &[u8; CELLS] {
        &self.cells
    }

    /// Exponent stored at `index` (row-major). Panics if `index >= 16`.
    #[inline]
    pub fn tile(&self, index: usize) -> u8 {
        self.cells[index]
    }

    #[inline]
    pub fn tile_at(&self, row: usize, col: usize) -> u8 {
        self.cells[row * 4 + col]
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|&&e| e == 0).count()
    }

    pub fn max_exponent(&self) -> u8 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    /// Value of the largest tile (0 on an empty board).
    pub fn max_tile(&self) -> u64 {
        tile_value(self.max_exponent())
    }

    /// Grid equality; the same test as `==`.
    #[inline]
    pub fn same_tiles(&self, other: &Board) -> bool {
        self == other
    }

    // -------------------------------------------------------------------------
    // Moves
    // -------------------------------------------------------------------------

    /// Slide and merge every row/column in the direction of `action`.
    ///
    /// Returns the resulting board (carrying the updated score) and the points
    /// earned by merges. A move that changes nothing returns an identical
    /// board and a delta of 0.
    pub fn apply_move(&self, action: Action) -> (Board, u64) {
        match action {
            Action::Left => self.shift_rows(false),
            Action::Right => self.shift_rows(true),
            Action::Up => {
                let (moved, delta) = self.transpose().shift_rows(false);
                (moved.transpose(), delta)
            }
            Action::Down => {
                let (moved, delta) = self.transpose().shift_rows(true);
                (moved.transpose(), delta)
            }
        }
    }

    /// Whether `action` changes at least one cell.
    #[inline]
    pub fn can_move(&self, action: Action) -> bool {
        !self.apply_move(action).0.same_tiles(self)
    }

    /// Legal actions in canonical order (Up, Down, Left, Right).
    pub fn legal_actions(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|&action| self.can_move(action))
            .collect()
    }

    /// True if no action is legal or a super-win tile is present.
    pub fn is_terminal(&self) -> bool {
        self.max_exponent() >= SUPER_WIN_EXPONENT
            || !Action::ALL.iter().any(|&action| self.can_move(action))
    }

    fn shift_rows(&self, toward_high: bool) -> (Board, u64) {
        let mut cells = [0u8; CELLS];
        let mut delta = 0u64;

        for row in 0..4 {
            let start = row * 4;
            let mut line = [
                self.cells[start],
                self.cells[start + 1],
                self.cells[start + 2],
                self.cells[start + 3],
            ];
            if toward_high {
                line.reverse();
            }
            let (mut merged, gained) = compress_and_merge(&line);
            if toward_high {
                merged.reverse();
            }
            cells[start..start + 4].copy_from_slice(&merged);
            delta = delta.saturating_add(gained);
        }

        (
            Board {
                cells,
                score: self.score.saturating_add(delta),
            },
            delta,
        )
    }

    // -------------------------------------------------------------------------
    // Spawning
    // -------------------------------------------------------------------------

    /// Every way nature can place a tile, with normalized probabilities.
    /// Empty iff the board is full.
    pub fn possible_spawns(&self) -> Vec<SpawnOutcome> {
        let empty = self.empty_count();
        if empty == 0 {
            return Vec::new();
        }
        let per_cell = 1.0 / empty as f64;
        let mut outcomes = Vec::with_capacity(empty * 2);
        for (index, _) in self.cells.iter().enumerate().filter(|(_, &e)| e == 0) {
            outcomes.push(SpawnOutcome {
                index,
                exponent: 1,
                probability: SPAWN_TWO_PROBABILITY * per_cell,
            });
            outcomes.push(SpawnOutcome {
                index,
                exponent: 2,
                probability: (1.0 - SPAWN_TWO_PROBABILITY) * per_cell,
            });
        }
        outcomes
    }

    /// Place a single tile in an empty cell.
    pub fn add_tile(&self, index: usize, exponent: u8) -> Result<Board> {
        if index >= CELLS {
            return Err(GameError::CellOutOfRange { index });
        }
        if exponent == 0 {
            return Err(GameError::InvalidExponent { exponent });
        }
        if self.cells[index] != 0 {
            return Err(GameError::OccupiedCell { index });
        }
        let mut cells = self.cells;
        cells[index] = exponent;
        Ok(Board {
            cells,
            score: self.score,
        })
    }

    /// Spawn a tile in a uniformly chosen empty cell (90% a 2, 10% a 4).
    /// A full board is returned unchanged.
    pub fn spawn_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Board {
        let empty_cells: Vec<usize> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, &e)| e == 0)
            .map(|(i, _)| i)
            .collect();

        if empty_cells.is_empty() {
            return *self;
        }

        let index = empty_cells[rng.gen_range(0..empty_cells.len())];
        let exponent = if rng.gen::<f64>() < SPAWN_TWO_PROBABILITY { 1 } else { 2 };
        let mut cells = self.cells;
        cells[index] = exponent;
        Board {
            cells,
            score: self.score,
        }
    }

    /// Apply `action` and then spawn a random tile if the move changed the grid.
    pub fn result<R: Rng + ?Sized>(&self, action: Action, rng: &mut R) -> (Board, u64) {
        let (moved, delta) = self.apply_move(action);
        if moved.same_tiles(self) {
            return (moved, delta);
        }
        (moved.spawn_random(rng), delta)
    }

    // -------------------------------------------------------------------------
    // Symmetries
    // -------------------------------------------------------------------------

    /// Swap rows and columns.
    pub fn transpose(&self) -> Board {
        self.remap(|row, col| (col, row))
    }

    /// Rotate `quarter_turns` times clockwise; `(r, c)` moves to `(c, 3 - r)`
    /// per turn. Turns are taken mod 4.
    pub fn rotate(&self, quarter_turns: u32) -> Board {
        match quarter_turns % 4 {
            0 => *self,
            1 => self.remap(|row, col| (col, 3 - row)),
            2 => self.remap(|row, col| (3 - row, 3 - col)),
            _ => self.remap(|row, col| (3 - col, row)),
        }
    }

    /// Mirror left to right.
    pub fn reflect(&self) -> Board {
        self.remap(|row, col| (row, 3 - col))
    }

    fn remap(&self, to: impl Fn(usize, usize) -> (usize, usize)) -> Board {
        let mut cells = [0u8; CELLS];
        for row in 0..4 {
            for col in 0..4 {
                let (new_row, new_col) = to(row, col);
                cells[new_row * 4 + new_col] = self.cells[row * 4 + col];
            }
        }
        Board {
            cells,
            score: self.score,
        }
    }
}

/// Compress and merge one line toward index 0, returning the new line and the
/// points earned. A tile produced by a merge does not merge again.
fn compress_and_merge(line: &[u8; 4]) -> ([u8; 4], u64) {
    let mut compacted = [0u8; 4];
    let mut len = 0;
    for &tile in line {
        if tile != 0 {
            compacted[len] = tile;
            len += 1;
        }
    }

    let mut result = [0u8; 4];
    let mut score = 0u64;
    let mut write_idx = 0;
    let mut i = 0;
    while i < len {
        if i + 1 < len && compacted[i] == compacted[i + 1] {
            let merged = compacted[i].saturating_add(1);
            result[write_idx] = merged;
            score = score.saturating_add(tile_value(merged));
            i += 2;
        } else {
            result[write_idx] = compacted[i];
            i += 1;
        }
        write_idx += 1;
    }

    (result, score)
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board {{ score: {} }}", self.score)?;
        for row in 0..4 {
            for col in 0..4 {
                write!(f, "{:3}", self.tile_at(row, col))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Score: {}", self.score)?;
        writeln!(f, "+------+------+------+------+")?;
        for row in 0..4 {
            write!(f, "|")?;
            for col in 0..4 {
                let exponent = self.tile_at(row, col);
                if exponent == 0 {
                    write!(f, "      |")?;
                } else {
                    write!(f, "{:^6}|", tile_value(exponent))?;
                }
            }
            writeln!(f)?;
            writeln!(f, "+------+------+------+------+")?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
