//! Core types shared by every subsystem: seats, competitions, RNG,
//! configuration, retry policies and timestamps.

pub mod clock;
pub mod competition;
pub mod config;
pub mod retry;
pub mod rng;
pub mod seat;

pub use clock::Timestamp;
pub use competition::Competition;
pub use config::{
    AllocationConfig, ArenaConfig, ConfigError, GameConfig, LedgerConfig, SelectionConfig,
    SyncConfig, WindowConfig,
};
pub use retry::{CircuitBreaker, CircuitOpen, CircuitState, RetryPolicy};
pub use rng::GameRng;
pub use seat::{Role, Seat, SeatMap, Team};
