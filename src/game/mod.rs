//! The match state machine.
//!
//! ## Key Types
//!
//! - `GameState`: board, turn order, clue, chat log and miss counters
//! - `TurnView`: what the acting seat may see
//! - `TurnResponse`: raw agent answer plus protocol checks
//! - `GameRunner`: plays a `GameState` to completion against live agents
//! - `GameOutcome`: winner, reason and per-seat rewards
//!
//! ## Turn order
//!
//! ```text
//! red spymaster -> red operative -> blue spymaster -> blue operative -> ...
//! ```
//!
//! A missed turn passes play to the other team's seat of the same role.

pub mod error;
pub mod response;
pub mod reward;
pub mod runner;
pub mod state;
pub mod view;

pub use error::{GameError, GameResult};
pub use response::TurnResponse;
pub use reward::{base_rewards, SpeedTracker};
pub use runner::{GameOutcome, GameRunner};
pub use state::{
    ChatMessage, Clue, EndReason, GameState, GuessReport, MissKind, MissOutcome, Occupant,
    MISSES_BEFORE_FORFEIT,
};
pub use view::TurnView;
