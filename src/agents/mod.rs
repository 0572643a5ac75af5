//! Agent boundaries: remote transport, local fallback and clue judging.
//!
//! ## Key Types
//!
//! - `AgentTransport`: reaches a participant's endpoint
//! - `QueryPolicy`: attempts, per-attempt timeout and saturation cut-off
//! - `LocalAgent`: fallback player for seats no participant occupies
//! - `ClueJudge`: verdict on whether a clue is legal for a board

pub mod judge;
pub mod policy;
pub mod transport;

pub use judge::{BoardWordJudge, ClueJudge};
pub use policy::{QueryOutcome, QueryPolicy};
pub use transport::{AgentTransport, LocalAgent, TransportError};
