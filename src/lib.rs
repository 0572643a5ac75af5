//! # clue-arena
//!
//! Validator engine for fairness-scheduled word-clue matches between remote
//! agents.
//!
//! ## Design Principles
//!
//! 1. **Explicit Boundaries**: The chain registry, agent transport, clue
//!    judge, transcript sink and sync backend are async traits. Their
//!    payloads are serde records validated where they enter the crate.
//!
//! 2. **Pure Rules**: `GameState` holds every rule of a match and performs
//!    no I/O. `GameRunner` only asks seats for moves and applies them.
//!
//! 3. **Fail Toward Burn**: When allocation safeguards fail the weight goes
//!    to the burn uid instead of surfacing an error.
//!
//! ## Architecture
//!
//! - **Fairness Selection**: participants that played least are matched
//!   first, opponents are paired by nearest recent average.
//!
//! - **Local Ledger**: SQLite outbox of this validator's games plus a mirror
//!   of the canonical backend ledger, pulled page by page through a cursor.
//!
//! - **Persistent Board**: `im::Vector` cards make state snapshots cheap.
//!
//! ## Modules
//!
//! - `core`: Seats, competitions, RNG, configuration, retry policies
//! - `board`: Cards, word lists and board generation
//! - `game`: Match state machine, turn views, rewards and the runner
//! - `agents`: Transport, local agent and judge traits, query policy
//! - `registry`: Chain registry trait and commitment parsing
//! - `transcript`: Live room publishing
//! - `ledger`: Score store and backend synchronization
//! - `selection`: Fairness selector
//! - `allocation`: Winner-take-all weight allocation
//! - `runtime`: Competition and maintenance loops, shutdown

pub mod core;
pub mod board;
pub mod game;
pub mod agents;
pub mod registry;
pub mod http;
pub mod transcript;
pub mod ledger;
pub mod selection;
pub mod allocation;
pub mod runtime;
pub mod error;

// Re-export commonly used types
pub use crate::core::{
    ArenaConfig, Competition, GameRng, Role, Seat, SeatMap, Team, Timestamp,
};

pub use crate::board::{Board, Card, CardColor, WordList};

pub use crate::game::{
    EndReason, GameError, GameOutcome, GameRunner, GameState, Occupant, TurnResponse, TurnView,
};

pub use crate::agents::{AgentTransport, BoardWordJudge, ClueJudge, LocalAgent, QueryPolicy};

pub use crate::registry::{ChainRegistry, CommitmentMap, EndpointRef, Participant};

pub use crate::transcript::{HttpTranscript, NullTranscript, TranscriptSink};

pub use crate::ledger::{HttpSyncBackend, ScoreLedger, ScoreRecord, SyncBackend, SyncEngine};

pub use crate::selection::{FairnessSelector, Selection, SelectionOutcome};

pub use crate::allocation::{Decision, WeightAllocator};

pub use crate::runtime::{CompetitionLoop, MaintenanceLoop, ShutdownCoordinator};

pub use crate::error::{ArenaError, ArenaResult};
