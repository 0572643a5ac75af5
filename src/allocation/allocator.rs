//! Allocation cycle against the registry.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::weights::{decide, vector_len, weights_for, BurnReason, Decision, WindowInputs};
use crate::core::{clock, AllocationConfig, Competition, Timestamp, WindowConfig};
use crate::ledger::{LedgerError, ScoreLedger};
use crate::registry::{ChainRegistry, RegistryError};

/// Failures that skip an allocation cycle.
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// What one cycle decided and submitted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AllocationReport {
    pub since: Timestamp,
    pub end: Timestamp,
    pub decisions: Vec<(Competition, Decision)>,
    /// Competitions whose weight submission was rejected.
    pub failed: Vec<Competition>,
}

/// Computes and submits one weight vector per competition.
pub struct WeightAllocator {
    registry: Arc<dyn ChainRegistry>,
    ledgers: Vec<Arc<ScoreLedger>>,
    config: AllocationConfig,
    windows: WindowConfig,
}

impl WeightAllocator {
    /// `ledgers` holds one ledger per competition.
    pub fn new(
        registry: Arc<dyn ChainRegistry>,
        ledgers: Vec<Arc<ScoreLedger>>,
        config: AllocationConfig,
        windows: WindowConfig,
    ) -> Self {
        Self {
            registry,
            ledgers,
            config,
            windows,
        }
    }

    pub async fn run_cycle(&self) -> Result<AllocationReport, AllocationError> {
        self.run_cycle_at(clock::now()).await
    }

    /// Run one cycle as of `now`.
    ///
    /// Registry reads and ledger reads must all succeed before anything is
    /// submitted; a failure skips the whole cycle.
    pub async fn run_cycle_at(&self, now: Timestamp) -> Result<AllocationReport, AllocationError> {
        let blocks = self.registry.blocks_since_epoch().await?;
        let epoch_age = (blocks as i64).saturating_mul(self.registry.block_time().as_secs() as i64);
        let end = now - epoch_age;
        let since = end - self.windows.scoring_window_secs;
        let participants = self.registry.participants().await?;
        let len = vector_len(&participants, self.config.burn_uid);

        let mut latest: Option<Timestamp> = None;
        for ledger in &self.ledgers {
            latest = latest.max(ledger.latest_timestamp()?);
        }
        let age = latest.map(|ts| now - ts);
        let stale = age.map_or(true, |age| age > self.config.staleness_secs);

        let mut planned = Vec::with_capacity(self.ledgers.len());
        for ledger in &self.ledgers {
            let competition = ledger.competition();
            let decision = if stale {
                Decision::Burn(BurnReason::Stale { age_secs: age })
            } else {
                let games = ledger.games_in_window(competition, since, end)?;
                let averages = ledger.window_average_scores_by_hotkey(competition, since, end)?;
                let counts = ledger.records_in_window(competition, since, end)?;
                decide(
                    &WindowInputs {
                        participants: &participants,
                        games,
                        averages: &averages,
                        counts: &counts,
                    },
                    &self.config,
                )
            };
            planned.push((competition, decision));
        }
        if stale {
            warn!(age_secs = ?age, "ledger data stale, burning every mechanism");
        }

        let mut report = AllocationReport {
            since,
            end,
            ..AllocationReport::default()
        };
        for (competition, decision) in planned {
            let weights = weights_for(&decision, len, &self.config);
            match &decision {
                Decision::Winner { uid, hotkey, average } => {
                    info!(competition = %competition, uid, hotkey = %hotkey, average, "competition winner");
                }
                Decision::Burn(reason) => {
                    info!(competition = %competition, reason = ?reason, "burning competition weight");
                }
            }
            if let Err(err) = self.registry.set_weights(competition.mechanism_id(), &weights).await {
                warn!(competition = %competition, error = %err, "weight submission failed");
                report.failed.push(competition);
            }
            report.decisions.push((competition, decision));
        }
        Ok(report)
    }
}
