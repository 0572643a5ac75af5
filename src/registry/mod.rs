//! Chain registry boundary.
//!
//! The registry knows every participant (uid, hotkey, stake), stores their
//! on-chain commitments and accepts weight vectors. The crate only sees it
//! through [`ChainRegistry`].
//!
//! ## Key Types
//!
//! - `Participant`: one registered identity
//! - `ChainRegistry`: async read/write interface
//! - `CommitmentMap` / `EndpointRef`: validated commitment contents

pub mod commitment;

pub use commitment::{CommitmentError, CommitmentMap, EndpointRef};

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::Competition;

/// Registry call failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("registry unavailable: {0}")]
    Unavailable(String),

    #[error("weight submission rejected: {0}")]
    Rejected(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// A registered identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub uid: u16,
    pub hotkey: String,
    pub stake: f64,
}

impl Participant {
    pub fn new(uid: u16, hotkey: impl Into<String>, stake: f64) -> Self {
        Self {
            uid,
            hotkey: hotkey.into(),
            stake,
        }
    }
}

/// Read/write access to the chain registry.
#[async_trait]
pub trait ChainRegistry: Send + Sync {
    /// Current participant snapshot, ordered by uid.
    async fn participants(&self) -> RegistryResult<Vec<Participant>>;

    /// Raw commitment blob for `uid`, if one was published.
    async fn commitment(&self, uid: u16) -> RegistryResult<Option<String>>;

    /// Blocks elapsed since the current epoch started.
    async fn blocks_since_epoch(&self) -> RegistryResult<u64>;

    /// Nominal block interval.
    fn block_time(&self) -> Duration;

    /// Submit a weight vector indexed by uid for `mechanism`.
    async fn set_weights(&self, mechanism: u8, weights: &[f64]) -> RegistryResult<()>;
}

/// Endpoints of `participants` committed for `competition`.
///
/// Participants without a commitment, or with a malformed one, are left out.
pub async fn committed_endpoints<R: ChainRegistry + ?Sized>(
    registry: &R,
    competition: Competition,
    participants: &[Participant],
) -> RegistryResult<HashMap<u16, EndpointRef>> {
    let mut endpoints = HashMap::new();
    for participant in participants {
        let Some(raw) = registry.commitment(participant.uid).await? else {
            continue;
        };
        match CommitmentMap::parse(&raw) {
            Ok(map) => {
                if let Some(endpoint) = map.endpoint(competition) {
                    endpoints.insert(participant.uid, endpoint.clone());
                }
            }
            Err(err) => debug!(uid = participant.uid, error = %err, "ignoring malformed commitment"),
        }
    }
    Ok(endpoints)
}
