//! Long-running competition and maintenance loops.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::shutdown::ShutdownCoordinator;
use crate::allocation::WeightAllocator;
use crate::board::WordList;
use crate::core::{Competition, GameRng, Seat, SeatMap, Team};
use crate::error::ArenaResult;
use crate::game::{GameOutcome, GameRunner, GameState, Occupant};
use crate::ledger::SyncEngine;
use crate::registry::Participant;
use crate::selection::{Candidate, FairnessSelector, Selection, SelectionOutcome};

/// Result of one round attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum Round {
    Played {
        outcome: GameOutcome,
        observers: Vec<Participant>,
    },
    /// No game was started: no pair formed, or shutdown was requested.
    Idle { observers: Vec<Participant> },
}

impl Round {
    /// Participants probed and rejected while selecting this round.
    #[must_use]
    pub fn observers(&self) -> &[Participant] {
        match self {
            Self::Played { observers, .. } | Self::Idle { observers } => observers,
        }
    }
}

/// Seats for a selected pair: player 1 on red, player 2 on blue, in the
/// competition's remote role. Other seats are local under `validator_hotkey`.
#[must_use]
pub fn build_roster(competition: Competition, selection: &Selection, validator_hotkey: &str) -> SeatMap<Occupant> {
    let remote = |candidate: &Candidate| Occupant::Remote {
        uid: candidate.uid(),
        hotkey: candidate.hotkey().to_string(),
        endpoint: candidate.endpoint.clone(),
    };
    SeatMap::new(|seat: Seat| {
        if !competition.is_remote_seat(seat) {
            return Occupant::local(validator_hotkey);
        }
        match seat.team {
            Team::Red => remote(&selection.player1),
            Team::Blue => remote(&selection.player2),
        }
    })
}

fn log_observers(competition: Competition, observers: &[Participant]) {
    if observers.is_empty() {
        return;
    }
    let uids: Vec<u16> = observers.iter().map(|p| p.uid).collect();
    info!(competition = %competition, observers = ?uids, "probed participants rejected this round");
}

/// Plays matches for one competition until shutdown.
pub struct CompetitionLoop {
    competition: Competition,
    selector: Arc<FairnessSelector>,
    runner: Arc<GameRunner>,
    sync: Arc<SyncEngine>,
    words: Arc<WordList>,
    validator_hotkey: String,
    max_turns: u32,
    idle_delay: Duration,
    shutdown: ShutdownCoordinator,
}

impl CompetitionLoop {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        competition: Competition,
        selector: Arc<FairnessSelector>,
        runner: Arc<GameRunner>,
        sync: Arc<SyncEngine>,
        words: Arc<WordList>,
        validator_hotkey: impl Into<String>,
        max_turns: u32,
        shutdown: ShutdownCoordinator,
    ) -> Self {
        Self {
            competition,
            selector,
            runner,
            sync,
            words,
            validator_hotkey: validator_hotkey.into(),
            max_turns,
            idle_delay: Duration::from_secs(30),
            shutdown,
        }
    }

    /// Pause between rounds that found no pair.
    #[must_use]
    pub fn with_idle_delay(mut self, delay: Duration) -> Self {
        self.idle_delay = delay;
        self
    }

    /// Select, play and record one match.
    ///
    /// The round holds a game guard from before selection until the result
    /// is recorded. No game starts once shutdown has been requested.
    pub async fn play_round(&self, rng: &mut GameRng) -> ArenaResult<Round> {
        let _guard = self.shutdown.game_guard();
        if self.shutdown.is_shutdown_requested() {
            return Ok(Round::Idle { observers: Vec::new() });
        }

        let exclude: HashSet<String> = self.sync.active_elsewhere().await.into_iter().collect();
        let ledger = self.sync.ledger();
        let selection = match self.selector.select(ledger, self.competition, &exclude, rng).await? {
            SelectionOutcome::Selected(selection) => selection,
            SelectionOutcome::Unpaired { observers } => {
                log_observers(self.competition, &observers);
                return Ok(Round::Idle { observers });
            }
        };
        log_observers(self.competition, &selection.observers);
        if self.shutdown.is_shutdown_requested() {
            info!(competition = %self.competition, "shutdown requested during selection, not starting game");
            return Ok(Round::Idle {
                observers: selection.observers,
            });
        }

        let roster = build_roster(self.competition, &selection, &self.validator_hotkey);
        let state = GameState::generate(self.competition, roster, &self.words, rng, self.max_turns)?;
        let outcome = self.runner.run(state).await?;
        ledger.record_game(&outcome.to_record())?;
        info!(
            competition = %self.competition,
            room_id = %outcome.room_id,
            winner = %outcome.winner,
            reason = %outcome.reason,
            turns = outcome.turns,
            "game recorded"
        );
        Ok(Round::Played {
            outcome,
            observers: selection.observers,
        })
    }

    /// Run rounds until shutdown is requested. A game in flight finishes first.
    pub async fn run(&self) {
        let mut rng = GameRng::from_entropy();
        info!(competition = %self.competition, seed = rng.seed(), "competition loop started");
        while !self.shutdown.is_shutdown_requested() {
            let pause = match self.play_round(&mut rng).await {
                Ok(Round::Played { .. }) => None,
                Ok(Round::Idle { .. }) => Some(self.idle_delay),
                Err(err) => {
                    error!(competition = %self.competition, error = %err, "round failed");
                    Some(self.idle_delay)
                }
            };
            if let Some(pause) = pause {
                tokio::select! {
                    _ = tokio::time::sleep(pause) => {}
                    _ = self.shutdown.wait_for_shutdown() => {}
                }
            }
        }
        info!(competition = %self.competition, "competition loop stopped");
    }
}

/// Periodic push, pull and allocation cadences.
pub struct MaintenanceLoop {
    engines: Vec<Arc<SyncEngine>>,
    allocator: Arc<WeightAllocator>,
    push_every: Duration,
    pull_every: Duration,
    allocate_every: Duration,
    shutdown: ShutdownCoordinator,
}

impl MaintenanceLoop {
    pub fn new(
        engines: Vec<Arc<SyncEngine>>,
        allocator: Arc<WeightAllocator>,
        push_every: Duration,
        pull_every: Duration,
        allocate_every: Duration,
        shutdown: ShutdownCoordinator,
    ) -> Self {
        Self {
            engines,
            allocator,
            push_every,
            pull_every,
            allocate_every,
            shutdown,
        }
    }

    pub async fn push_all(&self) {
        for engine in &self.engines {
            let competition = engine.ledger().competition();
            match engine.push_pending().await {
                Ok(report) if report.failed > 0 => {
                    warn!(competition = %competition, pushed = report.pushed, failed = report.failed, "push incomplete");
                }
                Ok(_) => {}
                Err(err) => warn!(competition = %competition, error = %err, "push cycle failed"),
            }
        }
    }

    pub async fn pull_all(&self) {
        for engine in &self.engines {
            if let Err(err) = engine.pull().await {
                warn!(competition = %engine.ledger().competition(), error = %err, "pull cycle failed");
            }
        }
    }

    pub async fn allocate(&self) {
        if let Err(err) = self.allocator.run_cycle().await {
            warn!(error = %err, "allocation cycle skipped");
        }
    }

    /// Run until shutdown, then push once more.
    pub async fn run(&self) {
        let mut push = tokio::time::interval(self.push_every);
        let mut pull = tokio::time::interval(self.pull_every);
        let mut allocate = tokio::time::interval(self.allocate_every);
        for timer in [&mut push, &mut pull, &mut allocate] {
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        }

        loop {
            tokio::select! {
                _ = self.shutdown.wait_for_shutdown() => break,
                _ = push.tick() => self.push_all().await,
                _ = pull.tick() => self.pull_all().await,
                _ = allocate.tick() => self.allocate().await,
            }
        }
        self.push_all().await;
        info!("maintenance loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;
    use crate::registry::EndpointRef;

    fn candidate(uid: u16) -> Candidate {
        Candidate {
            participant: Participant::new(uid, format!("hk{uid}"), 1.0),
            endpoint: EndpointRef::parse(&format!("10.0.0.{uid}:8091")).unwrap(),
            epoch_count: 0,
            window_count: 0,
            score: 0.0,
        }
    }

    fn selection() -> Selection {
        Selection {
            player1: candidate(3),
            player2: candidate(7),
            observers: Vec::new(),
        }
    }

    #[test]
    fn test_roster_clue_competition() {
        let roster = build_roster(Competition::ClueCompetition, &selection(), "validator");
        assert_eq!(roster[Seat::RED_SPYMASTER].uid(), Some(3));
        assert_eq!(roster[Seat::BLUE_SPYMASTER].uid(), Some(7));
        assert_eq!(roster[Seat::RED_OPERATIVE], Occupant::local("validator"));
        assert_eq!(roster[Seat::BLUE_OPERATIVE].hotkey(), "validator");
    }

    #[test]
    fn test_roster_guess_competition() {
        let roster = build_roster(Competition::GuessCompetition, &selection(), "validator");
        for (seat, occupant) in roster.iter() {
            assert_eq!(occupant.is_remote(), seat.role == Role::Operative);
        }
        assert_eq!(roster[Seat::BLUE_OPERATIVE].hotkey(), "hk7");
    }
}
