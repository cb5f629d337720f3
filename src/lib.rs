//! slide-2048: a square-grid 2048 engine.
//!
//! This crate provides:
//! - A `Board` with the move primitives (`compress_row`, `merge_row`, `shift`),
//!   tile spawning and terminal detection (`engine` module)
//! - A `Game` state machine (Playing / GameOver) with score, restart and
//!   seeded, reproducible spawns (`game` module)
//! - TOML-loadable settings (`config` module)
//! - Simple move policies for autoplay (`policy` module)
//! - A checksummed binary recording of finished games with replay (`trace` module)
//!
//! Quick start:
//! ```
//! use slide_2048::config::GameConfig;
//! use slide_2048::engine::Move;
//! use slide_2048::game::Game;
//!
//! let mut game = Game::new(&GameConfig { seed: Some(42), ..GameConfig::default() }).unwrap();
//! let outcome = game.make_move(Move::Left);
//! if outcome.changed {
//!     println!("{}", game.board());
//! }
//! assert!(!game.is_terminal());
//! ```
//!
pub mod config;
pub mod engine;
pub mod game;
pub mod policy;
pub mod trace;
