use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type Tile = u64;
pub type Score = u64;

/// Side length used when nothing else is configured.
pub const DEFAULT_SIZE: usize = 4;
pub const MIN_SIZE: usize = 2;
/// Probability that a spawned tile is a 4 rather than a 2.
pub const FOUR_PROBABILITY: f64 = 0.1;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Map a `w/a/s/d` key to a direction. Case-insensitive.
    pub fn from_key(key: char) -> Option<Move> {
        match key.to_ascii_lowercase() {
            'w' => Some(Move::Up),
            'a' => Some(Move::Left),
            's' => Some(Move::Down),
            'd' => Some(Move::Right),
            _ => None,
        }
    }

    /// Parse a whole `w/a/s/d` script. The first unknown key rejects it.
    ///
    /// ```
    /// use slide_2048::engine::{EngineError, Move};
    /// assert_eq!(Move::parse_keys("wd").unwrap(), vec![Move::Up, Move::Right]);
    /// assert_eq!(Move::parse_keys("wax"), Err(EngineError::InvalidKey { key: 'x', pos: 2 }));
    /// ```
    pub fn parse_keys(keys: &str) -> Result<Vec<Move>, EngineError> {
        keys.chars()
            .enumerate()
            .map(|(pos, key)| Move::from_key(key).ok_or(EngineError::InvalidKey { key, pos }))
            .collect()
    }

    /// Flat index of the `pos`-th cell along `line` when the board is viewed
    /// so that `self` points left. Position 0 is the cell tiles slide toward.
    #[inline]
    fn cell_index(self, size: usize, line: usize, pos: usize) -> usize {
        match self {
            Move::Left => line * size + pos,
            Move::Right => line * size + (size - 1 - pos),
            Move::Up => pos * size + line,
            Move::Down => (size - 1 - pos) * size + line,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        };
        f.write_str(name)
    }
}

impl FromStr for Move {
    type Err = EngineError;

    /// Accepts direction names or a single `w/a/s/d` key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        let mut chars = name.chars();
        if let (Some(key), None) = (chars.next(), chars.next()) {
            return Move::from_key(key).ok_or_else(|| EngineError::UnknownMove(s.to_string()));
        }
        match name.as_str() {
            "up" => Ok(Move::Up),
            "down" => Ok(Move::Down),
            "left" => Ok(Move::Left),
            "right" => Ok(Move::Right),
            _ => Err(EngineError::UnknownMove(s.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("board size {0} is below the minimum of {min}", min = MIN_SIZE)]
    InvalidSize(usize),
    #[error("unknown move {0:?}")]
    UnknownMove(String),
    #[error("invalid key {key:?} at position {pos} (expected w/a/s/d)")]
    InvalidKey { key: char, pos: usize },
    #[error("tile value {0} is not a power of two >= 2")]
    InvalidTile(Tile),
    #[error("expected {expected} cells, got {got}")]
    CellCount { expected: usize, got: usize },
}

/// Result of sliding a line or a whole board.
///
/// `score` is the sum of the tiles produced by merges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub changed: bool,
    pub score: Score,
}

/// Square 2048 grid stored row-major. `0` marks an empty cell.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    cells: Vec<Tile>,
}

impl Board {
    /// An all-empty board of the given side length.
    pub fn empty(size: usize) -> Result<Self, EngineError> {
        check_size(size)?;
        // An unrepresentable cell count saturates and the allocation fails.
        Ok(Board { size, cells: vec![0; size.saturating_mul(size)] })
    }

    /// An empty board seeded with two random tiles.
    ///
    /// ```
    /// use slide_2048::engine::Board;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(7);
    /// let b = Board::new(4, &mut rng).unwrap();
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn new<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Result<Self, EngineError> {
        let mut board = Board::empty(size)?;
        board.spawn_tile(rng);
        board.spawn_tile(rng);
        Ok(board)
    }

    /// Build a board from row-major cells, checking every tile.
    pub fn from_cells(size: usize, cells: Vec<Tile>) -> Result<Self, EngineError> {
        check_size(size)?;
        let expected = size.saturating_mul(size);
        if cells.len() != expected {
            return Err(EngineError::CellCount { expected, got: cells.len() });
        }
        if let Some(&bad) = cells.iter().find(|&&t| !is_valid_tile(t)) {
            return Err(EngineError::InvalidTile(bad));
        }
        Ok(Board { size, cells })
    }

    /// Build a board from rows. The number of rows sets the size.
    ///
    /// ```
    /// use slide_2048::engine::{Board, Move};
    /// let mut b = Board::from_rows(&[vec![2, 2], vec![0, 4]]).unwrap();
    /// assert!(b.shift(Move::Left).changed);
    /// assert_eq!(b.rows(), vec![vec![4, 0], vec![4, 0]]);
    /// ```
    pub fn from_rows(rows: &[Vec<Tile>]) -> Result<Self, EngineError> {
        let size = rows.len();
        let cells: Vec<Tile> = rows.iter().flatten().copied().collect();
        if let Some(row) = rows.iter().find(|r| r.len() != size) {
            return Err(EngineError::CellCount { expected: size, got: row.len() });
        }
        Board::from_cells(size, cells)
    }

    #[inline]
    pub fn size(&self) -> usize { self.size }

    /// Row-major view of every cell.
    #[inline]
    pub fn cells(&self) -> &[Tile] { &self.cells }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Tile { self.cells[row * self.size + col] }

    /// Owned copy of the grid, one `Vec` per row, for rendering.
    pub fn rows(&self) -> Vec<Vec<Tile>> {
        self.cells.chunks(self.size).map(|r| r.to_vec()).collect()
    }

    pub fn count_empty(&self) -> usize { self.cells.iter().filter(|&&t| t == 0).count() }

    /// Indices (row-major) of the empty cells.
    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells.iter().enumerate().filter(|&(_, &t)| t == 0).map(|(i, _)| i)
    }

    /// Empty every cell, keeping the size.
    pub fn clear(&mut self) { self.cells.fill(0) }

    pub fn highest_tile(&self) -> Tile { self.cells.iter().copied().max().unwrap_or(0) }

    /// Sum of all tile values.
    pub fn tile_sum(&self) -> Score { self.cells.iter().sum() }

    /// Slide and merge every line toward `dir`, in place. No random insert.
    pub fn shift(&mut self, dir: Move) -> MoveOutcome {
        let n = self.size;
        let mut line = vec![0; n];
        let mut outcome = MoveOutcome::default();
        for l in 0..n {
            for (p, slot) in line.iter_mut().enumerate() {
                *slot = self.cells[dir.cell_index(n, l, p)];
            }
            let compressed = compress_row(&mut line);
            let merged = merge_row(&mut line);
            compress_row(&mut line);
            if !(compressed || merged.changed) {
                continue;
            }
            outcome.changed = true;
            outcome.score += merged.score;
            for (p, &val) in line.iter().enumerate() {
                self.cells[dir.cell_index(n, l, p)] = val;
            }
        }
        outcome
    }

    /// True if shifting toward `dir` would change the board.
    pub fn can_move(&self, dir: Move) -> bool {
        let n = self.size;
        (0..n).any(|l| {
            (0..n - 1).any(|p| {
                let here = self.cells[dir.cell_index(n, l, p)];
                let next = self.cells[dir.cell_index(n, l, p + 1)];
                (here == 0 && next != 0) || (here != 0 && here == next)
            })
        })
    }

    /// Place a 2 (90%) or 4 (10%) in a uniformly chosen empty cell.
    pub fn spawn_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<(usize, Tile)> {
        self.spawn_tile_with(rng, FOUR_PROBABILITY)
    }

    /// Like [`Board::spawn_tile`] with an explicit chance of spawning a 4.
    ///
    /// Returns the cell index and value placed, or `None` on a full board.
    pub fn spawn_tile_with<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        four_probability: f64,
    ) -> Option<(usize, Tile)> {
        let empty: Vec<usize> = self.empty_cells().collect();
        let &idx = empty.choose(rng)?;
        let tile = if rng.gen::<f64>() < four_probability { 4 } else { 2 };
        self.cells[idx] = tile;
        Some((idx, tile))
    }

    /// True when the board is full and no two neighbours share a value.
    ///
    /// ```
    /// use slide_2048::engine::Board;
    /// let b = Board::from_rows(&[vec![2, 4], vec![4, 2]]).unwrap();
    /// assert!(b.is_terminal());
    /// ```
    pub fn is_terminal(&self) -> bool {
        if self.cells.contains(&0) {
            return false;
        }
        let n = self.size;
        for row in 0..n {
            for col in 0..n - 1 {
                if self.get(row, col) == self.get(row, col + 1) {
                    return false;
                }
            }
        }
        for col in 0..n {
            for row in 0..n - 1 {
                if self.get(row, col) == self.get(row + 1, col) {
                    return false;
                }
            }
        }
        true
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({}x{}, {:?})", self.size, self.size, self.rows())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.highest_tile().to_string().len().max(4) + 2;
        let divider = "-".repeat((width + 1) * self.size - 1);
        for (i, row) in self.cells.chunks(self.size).enumerate() {
            if i > 0 {
                writeln!(f, "{}", divider)?;
            }
            let line: Vec<String> = row.iter().map(|&t| format_val(t, width)).collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}

/// Slide non-zero tiles toward index 0, keeping their order.
///
/// Returns whether any tile changed position.
pub fn compress_row(row: &mut [Tile]) -> bool {
    let mut target = 0;
    let mut changed = false;
    for idx in 0..row.len() {
        let val = row[idx];
        if val == 0 {
            continue;
        }
        if idx != target {
            row[target] = val;
            row[idx] = 0;
            changed = true;
        }
        target += 1;
    }
    changed
}

/// Combine equal neighbours left to right in a single pass.
///
/// The doubled tile is not compared again in the same pass, so
/// `[2, 2, 2, 2]` becomes `[4, 0, 4, 0]`.
pub fn merge_row(row: &mut [Tile]) -> MoveOutcome {
    let mut outcome = MoveOutcome::default();
    let mut idx = 0;
    while idx + 1 < row.len() {
        if row[idx] != 0 && row[idx] == row[idx + 1] {
            row[idx] *= 2;
            row[idx + 1] = 0;
            outcome.changed = true;
            outcome.score += row[idx];
            idx += 2;
        } else {
            idx += 1;
        }
    }
    outcome
}

/// Zero or a power of two no smaller than 2.
#[inline]
pub fn is_valid_tile(tile: Tile) -> bool {
    tile == 0 || (tile >= 2 && tile.is_power_of_two())
}

/// Any side length of at least [`MIN_SIZE`] is accepted.
pub fn check_size(size: usize) -> Result<(), EngineError> {
    if size >= MIN_SIZE { Ok(()) } else { Err(EngineError::InvalidSize(size)) }
}

fn format_val(val: Tile, width: usize) -> String {
    match val {
        0 => " ".repeat(width),
        x => format!("{:^width$}", x, width = width),
    }
}
