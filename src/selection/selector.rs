//! Picks the two participants for the next match.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::pool::{first_slot_pool, second_slot_pool, Candidate};
use crate::agents::AgentTransport;
use crate::core::{clock, Competition, GameRng, SelectionConfig, Timestamp, WindowConfig};
use crate::ledger::{LedgerError, ScoreLedger};
use crate::registry::{committed_endpoints, ChainRegistry, EndpointRef, Participant, RegistryError};

/// Failures that skip a selection cycle.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// A chosen pair.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub player1: Candidate,
    pub player2: Candidate,
    /// Probed candidates rejected as unreachable or below the score floor.
    pub observers: Vec<Participant>,
}

/// Result of one selection pass.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionOutcome {
    Selected(Selection),
    /// No pair could be formed. `observers` were probed and rejected.
    Unpaired { observers: Vec<Participant> },
}

impl SelectionOutcome {
    /// Probed candidates rejected during this pass.
    #[must_use]
    pub fn observers(&self) -> &[Participant] {
        match self {
            Self::Selected(selection) => &selection.observers,
            Self::Unpaired { observers } => observers,
        }
    }

    #[must_use]
    pub fn into_selection(self) -> Option<Selection> {
        match self {
            Self::Selected(selection) => Some(selection),
            Self::Unpaired { .. } => None,
        }
    }
}

/// Fairness-driven matchmaker.
pub struct FairnessSelector {
    registry: Arc<dyn ChainRegistry>,
    transport: Arc<dyn AgentTransport>,
    config: SelectionConfig,
    windows: WindowConfig,
}

impl FairnessSelector {
    pub fn new(
        registry: Arc<dyn ChainRegistry>,
        transport: Arc<dyn AgentTransport>,
        config: SelectionConfig,
        windows: WindowConfig,
    ) -> Self {
        Self {
            registry,
            transport,
            config,
            windows,
        }
    }

    /// Select a pair for `competition`.
    ///
    /// `exclude` holds hotkeys that may not play, typically the ones the
    /// backend reports as active elsewhere. Rejected candidates are
    /// reported as observers whether or not a pair forms.
    pub async fn select(
        &self,
        ledger: &ScoreLedger,
        competition: Competition,
        exclude: &HashSet<String>,
        rng: &mut GameRng,
    ) -> Result<SelectionOutcome, SelectionError> {
        self.select_at(ledger, competition, exclude, rng, clock::now()).await
    }

    /// [`select`](Self::select) evaluated at a fixed `now`.
    pub async fn select_at(
        &self,
        ledger: &ScoreLedger,
        competition: Competition,
        exclude: &HashSet<String>,
        rng: &mut GameRng,
        now: Timestamp,
    ) -> Result<SelectionOutcome, SelectionError> {
        let mut candidates = self.eligible(ledger, competition, exclude, now).await?;
        if candidates.len() < 2 {
            debug!(competition = %competition, eligible = candidates.len(), "not enough eligible participants");
            return Ok(SelectionOutcome::Unpaired { observers: Vec::new() });
        }

        let reachable = self.probe_all(&candidates).await;
        let usable = |c: &Candidate| reachable.contains(&c.uid()) && c.score >= self.config.score_floor;
        let mut observers = Vec::new();

        // Player 1: shuffled minimum tier.
        let mut player1 = None;
        while player1.is_none() && !candidates.is_empty() {
            let mut pool = first_slot_pool(&candidates);
            rng.shuffle(&mut pool);
            for candidate in pool {
                candidates.retain(|c| c.uid() != candidate.uid());
                if usable(&candidate) {
                    player1 = Some(candidate);
                    break;
                }
                observers.push(candidate.participant);
            }
        }
        let Some(player1) = player1 else {
            info!(competition = %competition, observers = observers.len(), "no usable first player");
            return Ok(SelectionOutcome::Unpaired { observers });
        };

        // Player 2: closest score to player 1.
        let mut player2 = None;
        for attempt in 0..=self.config.max_pool_rebuilds {
            let Some(mut pool) =
                second_slot_pool(&candidates, self.config.median_slack, self.config.second_slot_cap)
            else {
                debug!(competition = %competition, attempt, "second slot pool empty or over cap");
                break;
            };
            rng.shuffle(&mut pool);
            pool.sort_by(|a, b| {
                let da = (a.score - player1.score).abs();
                let db = (b.score - player1.score).abs();
                da.total_cmp(&db)
            });
            for candidate in pool {
                candidates.retain(|c| c.uid() != candidate.uid());
                if usable(&candidate) {
                    player2 = Some(candidate);
                    break;
                }
                observers.push(candidate.participant);
            }
            if player2.is_some() {
                break;
            }
        }
        let Some(player2) = player2 else {
            info!(
                competition = %competition,
                player1 = player1.uid(),
                observers = observers.len(),
                "no usable second player"
            );
            return Ok(SelectionOutcome::Unpaired { observers });
        };

        info!(
            competition = %competition,
            player1 = player1.uid(),
            player2 = player2.uid(),
            observers = observers.len(),
            "participants selected"
        );
        Ok(SelectionOutcome::Selected(Selection {
            player1,
            player2,
            observers,
        }))
    }

    async fn eligible(
        &self,
        ledger: &ScoreLedger,
        competition: Competition,
        exclude: &HashSet<String>,
        now: Timestamp,
    ) -> Result<Vec<Candidate>, SelectionError> {
        let participants: Vec<Participant> = self
            .registry
            .participants()
            .await?
            .into_iter()
            .filter(|p| p.stake >= self.config.min_stake && !exclude.contains(&p.hotkey))
            .collect();
        let mut endpoints: HashMap<u16, EndpointRef> =
            committed_endpoints(self.registry.as_ref(), competition, &participants).await?;

        let end = now + 1;
        let epoch_counts = ledger.records_in_window(competition, end - self.windows.epoch_secs, end)?;
        let since = end - self.windows.scoring_window_secs;
        let window_counts = ledger.records_in_window(competition, since, end)?;
        let scores = ledger.window_average_scores_by_hotkey(competition, since, end)?;

        Ok(participants
            .into_iter()
            .filter_map(|participant| {
                let endpoint = endpoints.remove(&participant.uid)?;
                let hotkey = participant.hotkey.as_str();
                Some(Candidate {
                    epoch_count: epoch_counts.get(hotkey).copied().unwrap_or(0),
                    window_count: window_counts.get(hotkey).copied().unwrap_or(0),
                    score: scores.get(hotkey).copied().unwrap_or(0.0),
                    endpoint,
                    participant,
                })
            })
            .collect())
    }

    /// Uids that answered a ping, after one retry pass over failures.
    async fn probe_all(&self, candidates: &[Candidate]) -> HashSet<u16> {
        let timeout = self.config.probe_timeout();
        let mut reachable = HashSet::new();
        let mut pending: Vec<&Candidate> = candidates.iter().collect();

        for pass in 0..2 {
            let results = join_all(pending.iter().map(|c| self.probe(&c.endpoint, timeout))).await;
            let mut failed = Vec::new();
            for (candidate, ok) in pending.into_iter().zip(results) {
                if ok {
                    reachable.insert(candidate.uid());
                } else {
                    failed.push(candidate);
                }
            }
            if failed.is_empty() {
                break;
            }
            debug!(pass, failed = failed.len(), "reachability probe failures");
            pending = failed;
        }
        reachable
    }

    async fn probe(&self, endpoint: &EndpointRef, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.transport.ping(endpoint, timeout)).await {
            Ok(Ok(healthy)) => healthy,
            Ok(Err(err)) => {
                warn!(endpoint = %endpoint, error = %err, "probe failed");
                false
            }
            Err(_) => false,
        }
    }
}
