//! Crate-level error aggregating every subsystem.

use thiserror::Error;

use crate::agents::TransportError;
use crate::allocation::AllocationError;
use crate::core::ConfigError;
use crate::game::GameError;
use crate::ledger::{LedgerError, SyncError};
use crate::registry::{CommitmentError, RegistryError};
use crate::selection::SelectionError;
use crate::transcript::TranscriptError;

#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("game error: {0}")]
    Game(#[from] GameError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("commitment error: {0}")]
    Commitment(#[from] CommitmentError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("transcript error: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("allocation error: {0}")]
    Allocation(#[from] AllocationError),
}

pub type ArenaResult<T> = Result<T, ArenaError>;
