//! Playing/GameOver state machine around a [`Board`].
//!
//! A [`Game`] owns the board, its ChaCha8 random source and the running
//! score. Each game is fully determined by its seed, its starting position
//! when built with [`Game::with_board`], and the list of moves that changed
//! the board. That is what [`crate::trace`] records.
//!
//! ```
//! use slide_2048::config::GameConfig;
//! use slide_2048::engine::Move;
//! use slide_2048::game::{Game, GameState};
//!
//! let cfg = GameConfig { seed: Some(1), ..GameConfig::default() };
//! let mut game = Game::new(&cfg).unwrap();
//! for dir in [Move::Left, Move::Up, Move::Right, Move::Down] {
//!     let outcome = game.make_move(dir);
//!     if outcome.changed && game.is_terminal() {
//!         break;
//!     }
//! }
//! assert_eq!(game.state(), GameState::Playing);
//! ```

use log::{debug, info, trace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, GameConfig};
use crate::engine::{Board, Move, MoveOutcome, Score, Tile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Playing,
    GameOver,
}

/// Counts of spawned tiles by value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnStats {
    pub twos: u64,
    pub fours: u64,
}

impl SpawnStats {
    pub fn total(&self) -> u64 { self.twos + self.fours }

    fn record(&mut self, tile: Tile) {
        if tile == 4 { self.fours += 1 } else { self.twos += 1 }
    }
}

#[derive(Debug, Clone)]
pub struct Game {
    config: GameConfig,
    board: Board,
    rng: ChaCha8Rng,
    seed: u64,
    /// Position given to `with_board`; `None` for seeded openings.
    start: Option<Board>,
    state: GameState,
    score: Score,
    history: Vec<Move>,
    spawns: SpawnStats,
}

impl Game {
    /// Validate `config` and start a game with two random tiles.
    pub fn new(config: &GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut spawns = SpawnStats::default();
        let mut board = Board::empty(config.size)?;
        spawn_opening(&mut board, &mut rng, config.four_probability, &mut spawns);
        Ok(Game {
            config: config.clone(),
            board,
            rng,
            seed,
            start: None,
            state: GameState::Playing,
            score: 0,
            history: Vec::new(),
            spawns,
        })
    }

    /// Start from an arbitrary position. `seed` drives later spawns.
    ///
    /// The board size overrides `config.size`.
    pub fn with_board(config: &GameConfig, board: Board, seed: u64) -> Result<Self, ConfigError> {
        let config = GameConfig { size: board.size(), seed: Some(seed), ..config.clone() };
        config.validate()?;
        let state = if board.is_terminal() { GameState::GameOver } else { GameState::Playing };
        Ok(Game {
            config,
            board: board.clone(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            start: Some(board),
            state,
            score: 0,
            history: Vec::new(),
            spawns: SpawnStats::default(),
        })
    }

    /// Slide toward `dir`. A changed board gets one new tile, after which
    /// the terminal check runs. No-op once the game is over.
    pub fn make_move(&mut self, dir: Move) -> MoveOutcome {
        if self.state == GameState::GameOver {
            debug!("ignoring {} after game over", dir);
            return MoveOutcome::default();
        }
        let outcome = self.board.shift(dir);
        if !outcome.changed {
            debug!("{} does not change the board", dir);
            return outcome;
        }
        self.score += outcome.score;
        self.history.push(dir);
        if let Some((idx, tile)) = self.board.spawn_tile_with(&mut self.rng, self.config.four_probability) {
            trace!("spawned {} at cell {}", tile, idx);
            self.spawns.record(tile);
        }
        if self.board.is_terminal() {
            self.state = GameState::GameOver;
            info!(
                "game over after {} moves: score {}, highest tile {}",
                self.history.len(),
                self.score,
                self.board.highest_tile()
            );
        }
        outcome
    }

    /// Rebuild the seeded opening of the current seed and clear all counters.
    ///
    /// A game started with [`Game::with_board`] becomes a seeded game here.
    pub fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.spawns = SpawnStats::default();
        self.start = None;
        self.board.clear();
        spawn_opening(&mut self.board, &mut self.rng, self.config.four_probability, &mut self.spawns);
        self.state = GameState::Playing;
        self.score = 0;
        self.history.clear();
    }

    /// Start a fresh game with a new seed drawn from the current random source.
    pub fn restart(&mut self) {
        self.seed = self.rng.gen();
        info!("restarting with seed {}", self.seed);
        self.reset();
    }

    pub fn is_terminal(&self) -> bool { self.board.is_terminal() }

    pub fn state(&self) -> GameState { self.state }

    pub fn board(&self) -> &Board { &self.board }

    /// Copy of the grid for rendering.
    pub fn board_snapshot(&self) -> Vec<Vec<Tile>> { self.board.rows() }

    /// Directions that would change the board right now.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.state == GameState::GameOver {
            return Vec::new();
        }
        Move::ALL.into_iter().filter(|&dir| self.board.can_move(dir)).collect()
    }

    pub fn score(&self) -> Score { self.score }

    pub fn highest_tile(&self) -> Tile { self.board.highest_tile() }

    /// Seed of the current game (changes on [`Game::restart`]).
    pub fn seed(&self) -> u64 { self.seed }

    /// Starting position for games built with [`Game::with_board`].
    pub fn start_board(&self) -> Option<&Board> { self.start.as_ref() }

    /// Moves that changed the board, in order.
    pub fn history(&self) -> &[Move] { &self.history }

    pub fn spawns(&self) -> SpawnStats { self.spawns }

    pub fn config(&self) -> &GameConfig { &self.config }
}

fn spawn_opening(board: &mut Board, rng: &mut ChaCha8Rng, four_probability: f64, spawns: &mut SpawnStats) {
    for _ in 0..2 {
        if let Some((_, tile)) = board.spawn_tile_with(rng, four_probability) {
            spawns.record(tile);
        }
    }
}
