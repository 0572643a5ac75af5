//! Push and pull synchronisation with the backend ledger.
//!
//! ## Push
//!
//! Every unsynced outbox row is sent individually. Accepted rows are
//! marked synced; rejected rows stay pending for the next cycle.
//!
//! ## Pull
//!
//! Pages are fetched from the stored cursor and applied one transaction at
//! a time, so an interrupted pull resumes from the last applied page. A
//! cycle stops when the backend reports no more pages, when the cursor does
//! not advance, or after `max_pages_per_cycle` pages.
//!
//! Both directions sit behind one [`CircuitBreaker`].

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::record::{PushPayload, SyncPage};
use super::store::{LedgerError, ScoreLedger};
use crate::core::{clock, CircuitBreaker, CircuitOpen, Competition, RetryPolicy, SyncConfig};

/// Sync failures. Local data is never lost on any of these.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed backend payload: {0}")]
    Malformed(String),

    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpen),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Remote side of the score ledger.
#[async_trait]
pub trait SyncBackend: Send + Sync {
    /// Submit one finished game.
    async fn push(&self, room_id: &str, payload: &PushPayload) -> SyncResult<()>;

    /// Fetch canonical rows with id greater than `since_id`.
    async fn fetch_page(&self, competition: Competition, since_id: i64, limit: u32) -> SyncResult<SyncPage>;

    /// Hotkeys currently playing on other validators.
    async fn active_miners(&self, competition: Competition) -> SyncResult<Vec<String>>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PushReport {
    pub pushed: usize,
    pub failed: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PullReport {
    pub pages: u32,
    pub rows: usize,
    pub cursor: i64,
}

/// Moves records between a [`ScoreLedger`] and a [`SyncBackend`].
pub struct SyncEngine {
    ledger: Arc<ScoreLedger>,
    backend: Arc<dyn SyncBackend>,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
    page_limit: u32,
    max_pages: u32,
}

impl SyncEngine {
    pub fn new(ledger: Arc<ScoreLedger>, backend: Arc<dyn SyncBackend>, config: &SyncConfig) -> Self {
        Self {
            ledger,
            backend,
            retry: config.retry.clone(),
            breaker: CircuitBreaker::new(
                config.breaker_threshold,
                std::time::Duration::from_secs(config.breaker_recovery_secs),
            ),
            page_limit: config.page_limit.max(1),
            max_pages: config.max_pages_per_cycle.max(1),
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &Arc<ScoreLedger> {
        &self.ledger
    }

    #[must_use]
    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Push every pending outbox row.
    pub async fn push_pending(&self) -> SyncResult<PushReport> {
        self.breaker.allow()?;
        let pending = self.ledger.pending()?;
        let mut report = PushReport::default();

        let total = pending.len();
        for (i, record) in pending.into_iter().enumerate() {
            if self.breaker.allow().is_err() {
                warn!(deferred = total - i, "circuit opened during push, deferring the rest");
                break;
            }
            let payload = PushPayload::from(&record);
            match self.backend.push(&record.room_id, &payload).await {
                Ok(()) => {
                    self.breaker.record_success();
                    self.ledger.mark_synced(&record.room_id, clock::now())?;
                    report.pushed += 1;
                }
                Err(err) => {
                    self.breaker.record_failure();
                    warn!(room_id = %record.room_id, error = %err, "push failed, will retry next cycle");
                    report.failed += 1;
                }
            }
        }

        if report.pushed + report.failed > 0 {
            info!(pushed = report.pushed, failed = report.failed, "push cycle finished");
        }
        Ok(report)
    }

    /// Pull canonical pages from the stored cursor.
    pub async fn pull(&self) -> SyncResult<PullReport> {
        let competition = self.ledger.competition();
        let mut report = PullReport {
            cursor: self.ledger.cursor()?,
            ..PullReport::default()
        };

        while report.pages < self.max_pages {
            self.breaker.allow()?;
            let since = report.cursor;
            let page = match self
                .retry
                .run("pull_page", || self.backend.fetch_page(competition, since, self.page_limit))
                .await
            {
                Ok(page) => {
                    self.breaker.record_success();
                    page
                }
                Err(err) => {
                    self.breaker.record_failure();
                    warn!(since_id = since, error = %err, "pull failed, cursor kept");
                    return Err(err);
                }
            };

            report.rows += self.ledger.apply_page(&page)?;
            report.pages += 1;
            report.cursor = self.ledger.cursor()?;
            debug!(since_id = since, cursor = report.cursor, rows = page.data.len(), "page applied");

            if !page.meta.has_more {
                break;
            }
            if report.cursor <= since {
                warn!(since_id = since, "cursor did not advance, stopping pull");
                break;
            }
        }

        info!(competition = %competition, pages = report.pages, rows = report.rows, cursor = report.cursor, "pull cycle finished");
        Ok(report)
    }

    /// Hotkeys to exclude from selection. Empty when the backend is unreachable.
    pub async fn active_elsewhere(&self) -> Vec<String> {
        if self.breaker.allow().is_err() {
            return Vec::new();
        }
        match self.backend.active_miners(self.ledger.competition()).await {
            Ok(hotkeys) => {
                self.breaker.record_success();
                hotkeys
            }
            Err(err) => {
                self.breaker.record_failure();
                warn!(error = %err, "active miner lookup failed");
                Vec::new()
            }
        }
    }
}
