//! Binary recordings of finished games.
//!
//! Layout: 4-byte magic, 1-byte version, postcard payload ([`Run`]), then a
//! little-endian CRC32C of everything before it. A run stores the seed, the
//! starting cells of games built from a position, and the moves that changed
//! the board, so [`replay`] can rebuild the game.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, GameConfig};
use crate::engine::{Board, EngineError, Move, Score, Tile};
use crate::game::Game;

const MAGIC: &[u8; 4] = b"S2R1";
const VERSION: u8 = 1;
const HEADER_LEN: usize = 4 + 1;
const CHECKSUM_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub size: u32,
    pub seed: u64,
    pub four_probability: f64,
    pub steps: u32,
    pub final_score: Score,
    pub highest_tile: Tile,
    pub start_unix_s: u64,
    pub elapsed_s: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub meta: Meta,
    /// Starting position; `None` when the game opened from its seed.
    pub start_cells: Option<Vec<Tile>>, // row-major, length = size * size
    pub moves: Vec<Move>,               // length = steps
    pub final_cells: Vec<Tile>,         // row-major, length = size * size
}

impl Run {
    /// Capture the current game. Only moves since the last reset are included.
    pub fn from_game(game: &Game, start_unix_s: u64, elapsed_s: f32) -> Result<Self, TraceError> {
        let board = game.board();
        let size = u32::try_from(board.size()).map_err(|_| TraceError::SizeOverflow(board.size()))?;
        let made = game.history().len();
        let steps = u32::try_from(made).map_err(|_| TraceError::TooManySteps(made))?;
        Ok(Run {
            meta: Meta {
                size,
                seed: game.seed(),
                four_probability: game.config().four_probability,
                steps,
                final_score: game.score(),
                highest_tile: game.highest_tile(),
                start_unix_s,
                elapsed_s,
            },
            start_cells: game.start_board().map(|b| b.cells().to_vec()),
            moves: game.history().to_vec(),
            final_cells: board.cells().to_vec(),
        })
    }

    pub fn config(&self) -> GameConfig {
        GameConfig {
            size: self.meta.size as usize,
            four_probability: self.meta.four_probability,
            seed: Some(self.meta.seed),
        }
    }

    pub fn final_board(&self) -> Result<Board, EngineError> {
        Board::from_cells(self.meta.size as usize, self.final_cells.clone())
    }

    pub fn start_board(&self) -> Result<Option<Board>, EngineError> {
        self.start_cells
            .as_ref()
            .map(|cells| Board::from_cells(self.meta.size as usize, cells.clone()))
            .transpose()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid magic or version")]
    MagicOrVersion,
    #[error("file too short or malformed")]
    Malformed,
    #[error("board size {0} does not fit the trace format")]
    SizeOverflow(usize),
    #[error("{0} moves do not fit the trace format")]
    TooManySteps(usize),
    #[error("checksum mismatch")]
    Checksum,
    #[error("postcard error: {0}")]
    Postcard(#[from] postcard::Error),
    #[error("invalid game settings: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid board: {0}")]
    Board(#[from] EngineError),
    #[error("replay diverged at step {step}")]
    Diverged { step: usize },
}

pub fn encode_run(run: &Run) -> Result<Vec<u8>, TraceError> {
    let payload = postcard::to_allocvec(run)?;
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len() + CHECKSUM_LEN);
    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.extend_from_slice(&payload);
    let checksum = crc32c::crc32c(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    Ok(buf)
}

pub fn parse_run_bytes(bytes: &[u8]) -> Result<Run, TraceError> {
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(TraceError::Malformed);
    }
    // Validate checksum first so a corrupted payload never reaches postcard.
    let (content, trailer) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    let file_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if file_crc != crc32c::crc32c(content) {
        return Err(TraceError::Checksum);
    }
    if &content[..4] != MAGIC || content[4] != VERSION {
        return Err(TraceError::MagicOrVersion);
    }
    let run: Run = postcard::from_bytes(&content[HEADER_LEN..])?;
    let size = run.meta.size as usize;
    let cells = size.checked_mul(size).ok_or(TraceError::Malformed)?;
    let start_ok = run.start_cells.as_ref().map_or(true, |c| c.len() == cells);
    if run.moves.len() != run.meta.steps as usize || run.final_cells.len() != cells || !start_ok {
        return Err(TraceError::Malformed);
    }
    Ok(run)
}

pub fn write_run_to_path<P: AsRef<Path>>(path: P, run: &Run) -> Result<(), TraceError> {
    let data = encode_run(run)?;
    let mut f = fs::File::create(path)?;
    f.write_all(&data)?;
    Ok(())
}

pub fn parse_run_file<P: AsRef<Path>>(path: P) -> Result<Run, TraceError> {
    let data = fs::read(path)?;
    parse_run_bytes(&data)
}

/// Rebuild a recorded game and check it ends on the recorded board.
pub fn replay(run: &Run) -> Result<Game, TraceError> {
    let mut game = match run.start_board()? {
        Some(board) => Game::with_board(&run.config(), board, run.meta.seed)?,
        None => Game::new(&run.config())?,
    };
    for (step, &dir) in run.moves.iter().enumerate() {
        if !game.make_move(dir).changed {
            return Err(TraceError::Diverged { step });
        }
    }
    if game.board() != &run.final_board()? || game.score() != run.meta.final_score {
        return Err(TraceError::Diverged { step: run.moves.len() });
    }
    Ok(game)
}

pub fn now_unix_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
