//! Fairness selection of match participants.
//!
//! Participants that pass the stake, commitment and exclusion checks are
//! narrowed to those that have played least, so every identity gets a
//! similar number of games. The second participant is the reachable one
//! whose recent average score is closest to the first.
//!
//! ## Key Types
//!
//! - `Candidate`: eligible participant with its window counters
//! - `FairnessSelector`: async selector over the registry and transport
//! - `Selection`: the chosen pair plus rejected observers
//! - `SelectionOutcome`: a selection, or the observers of a pass that found no pair

pub mod pool;
pub mod selector;

pub use pool::{first_slot_pool, median, min_tier, second_slot_pool, Candidate};
pub use selector::{FairnessSelector, Selection, SelectionError, SelectionOutcome};
