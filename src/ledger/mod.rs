//! Score ledger and backend synchronisation.
//!
//! ## Key Types
//!
//! - `ScoreRecord`: one finished game with per-seat hotkeys and scores
//! - `ScoreLedger`: SQLite outbox, canonical mirror and window queries
//! - `SyncEngine`: push/pull cycles over a `SyncBackend`
//! - `HttpSyncBackend`: REST backend client

pub mod backend;
pub mod record;
pub mod store;
pub mod sync;

pub use backend::HttpSyncBackend;
pub use record::{
    PushPayload, ScoreRecord, SeatScore, SyncMeta, SyncPage, SyncRow, TeamScores, WindowAggregate,
};
pub use store::{ledger_path, LedgerError, LedgerResult, ScoreLedger};
pub use sync::{PullReport, PushReport, SyncBackend, SyncEngine, SyncError, SyncResult};
