//! Weight allocation.
//!
//! Each competition's slot goes entirely to the identity with the strictly
//! highest recent average, or to the burn uid when any safeguard fails:
//! stale ledger data, too few games, ties or no positive average.
//!
//! ## Key Types
//!
//! - `Decision` / `BurnReason`: per-competition outcome
//! - `WeightAllocator`: reads the ledgers and submits vectors

pub mod allocator;
pub mod weights;

pub use allocator::{AllocationError, AllocationReport, WeightAllocator};
pub use weights::{burn_vector, decide, vector_len, weights_for, BurnReason, Decision, WindowInputs};
