//! Game state errors.

use thiserror::Error;

use crate::board::BoardError;
use crate::core::{Role, Team};

/// Rejected state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The game already has a winner.
    #[error("game is over, {winner} won")]
    GameOver { winner: Team },

    /// The call does not match the role whose turn it is.
    #[error("expected a {expected} turn, current turn is {actual}")]
    WrongRole { expected: Role, actual: Role },

    #[error(transparent)]
    Board(#[from] BoardError),
}

pub type GameResult<T> = Result<T, GameError>;
