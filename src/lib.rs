//! A time-boxed Connect 4 engine for driving a token-placing robot arm
//!
//! The engine searches the game tree with negamax and alpha-beta pruning
//! under a hard wall-clock budget. A run that hits the budget returns an
//! aborted evaluation, and the position cache keeps the progress made so
//! far, so the same entry point can simply be called again on the next
//! tick with the same board until the evaluation becomes playable.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_engine::{bitboard::BitBoard, search::SearchEngine};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let board = BitBoard::from_moves("443355")?;
//! let mut engine = SearchEngine::new();
//! let eval = engine.search(board, 8, 1_000);
//!
//! assert!(eval.is_playable());
//! assert!((eval.score, eval.column) == (Some(18), Some(1)));
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod bitboard;

pub mod tactics;

pub mod evaluation;

pub mod position_cache;

pub mod search;

mod test;

/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

// ensure that the given dimensions fit in a u64 for the bitboard representation
const_assert!(WIDTH * (HEIGHT + 1) < 64);
