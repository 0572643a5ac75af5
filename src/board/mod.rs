//! The 25-tile word board.
//!
//! ## Key Types
//!
//! - `CardColor`: Hidden tile colour (team, bystander, assassin)
//! - `Card`: Tile state (word, colour, revealed flags)
//! - `CardView`: Role-scoped tile as sent to agents
//! - `Board`: Ordered tiles with per-team remaining counters
//! - `WordList`: Candidate words for board generation

pub mod board;
pub mod card;
pub mod words;

pub use board::{Board, RevealOutcome, ASSASSIN_CARDS, BLUE_CARDS, BOARD_SIZE, BYSTANDER_CARDS, RED_CARDS};
pub use card::{Card, CardColor, CardView};
pub use words::{WordList, DEFAULT_WORDS};

use thiserror::Error;

/// Board construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("word list has {available} distinct words, board needs {needed}")]
    NotEnoughWords { needed: usize, available: usize },
}
