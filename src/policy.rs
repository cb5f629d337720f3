//! Automatic move selection for autoplay and simulations.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::engine::{Board, Move};
use crate::game::{Game, GameState};

/// Chooses the next direction for a board.
///
/// Returning `None` means no direction changes the board.
pub trait Policy {
    fn choose(&mut self, board: &Board) -> Option<Move>;
}

/// Uniform choice among the moves that change the board.
pub struct RandomPolicy<R> {
    rng: R,
}

impl<R: Rng> RandomPolicy<R> {
    pub fn new(rng: R) -> Self { Self { rng } }
}

impl<R: Rng> Policy for RandomPolicy<R> {
    fn choose(&mut self, board: &Board) -> Option<Move> {
        let legal: Vec<Move> = Move::ALL.into_iter().filter(|&d| board.can_move(d)).collect();
        legal.choose(&mut self.rng).copied()
    }
}

/// First legal move in a fixed order of preference.
#[derive(Debug, Clone)]
pub struct PreferencePolicy {
    order: Vec<Move>,
}

impl PreferencePolicy {
    pub fn new(order: Vec<Move>) -> Self { Self { order } }
}

impl Default for PreferencePolicy {
    /// Keeps large tiles in the top-left corner.
    fn default() -> Self { Self::new(vec![Move::Left, Move::Up, Move::Right, Move::Down]) }
}

impl Policy for PreferencePolicy {
    fn choose(&mut self, board: &Board) -> Option<Move> {
        self.order.iter().copied().find(|&d| board.can_move(d))
    }
}

/// Drive `game` with `policy` until game over, the policy gives up, or
/// `max_moves` changed moves have been made. A choice that leaves the board
/// unchanged also stops play. Returns the number of moves made.
pub fn play_out<P: Policy + ?Sized>(game: &mut Game, policy: &mut P, max_moves: Option<u64>) -> u64 {
    let mut moves = 0u64;
    while game.state() == GameState::Playing {
        if max_moves.is_some_and(|cap| moves >= cap) {
            break;
        }
        let Some(dir) = policy.choose(game.board()) else {
            debug!("policy found no legal move");
            break;
        };
        if !game.make_move(dir).changed {
            debug!("policy chose {}, which left the board unchanged", dir);
            break;
        }
        moves += 1;
    }
    moves
}
