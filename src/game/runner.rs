//! Drives one match from first clue to terminal state.
//!
//! The runner owns no game rules. Each turn it builds the acting seat's
//! view, asks the occupant (remote participants through the
//! [`QueryPolicy`], local seats through the [`LocalAgent`]), classifies the
//! answer and hands it to [`GameState`]. Every transition is mirrored to the
//! [`TranscriptSink`]; publishing failures are logged and ignored.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::GameError;
use super::response::TurnResponse;
use super::reward::{base_rewards, SpeedTracker};
use super::state::{EndReason, GameState, MissKind, Occupant};
use super::view::TurnView;
use crate::agents::{AgentTransport, ClueJudge, LocalAgent, QueryPolicy};
use crate::core::{clock, Competition, GameConfig, Role, Seat, SeatMap, Team, Timestamp};
use crate::ledger::ScoreRecord;
use crate::transcript::{RoomPayload, TranscriptSink};

/// Result of a finished match.
#[derive(Clone, Debug, PartialEq)]
pub struct GameOutcome {
    /// Transcript room id, or the game id when no room was created.
    pub room_id: String,
    pub competition: Competition,
    pub roster: SeatMap<Occupant>,
    pub winner: Team,
    pub reason: EndReason,
    pub rewards: SeatMap<f64>,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub turns: u32,
}

impl GameOutcome {
    /// Ledger row for this outcome.
    #[must_use]
    pub fn to_record(&self) -> ScoreRecord {
        ScoreRecord {
            room_id: self.room_id.clone(),
            competition: self.competition,
            hotkeys: self.roster.map(|_, o| o.hotkey().to_string()),
            scores: self.rewards.clone(),
            winner: Some(self.winner),
            started_at: self.started_at,
            ended_at: self.ended_at,
            reason: Some(self.reason),
            synced_at: None,
        }
    }
}

/// Collaborators used to play matches.
pub struct GameRunner {
    transport: Arc<dyn AgentTransport>,
    local: Arc<dyn LocalAgent>,
    judge: Arc<dyn ClueJudge>,
    transcript: Arc<dyn TranscriptSink>,
    policy: QueryPolicy,
    speed_modifier: bool,
    validator_key: String,
}

impl GameRunner {
    pub fn new(
        transport: Arc<dyn AgentTransport>,
        local: Arc<dyn LocalAgent>,
        judge: Arc<dyn ClueJudge>,
        transcript: Arc<dyn TranscriptSink>,
        validator_key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            local,
            judge,
            transcript,
            policy: QueryPolicy::default(),
            speed_modifier: false,
            validator_key: validator_key.into(),
        }
    }

    /// Apply the query policy and speed-modifier settings from `config`.
    #[must_use]
    pub fn with_config(mut self, config: &GameConfig) -> Self {
        self.policy = QueryPolicy::from_config(config);
        self.speed_modifier = config.speed_modifier;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: QueryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Play `state` to completion.
    ///
    /// Fails only if a transition is rejected, in which case the transcript
    /// room is deleted.
    pub async fn run(&self, mut state: GameState) -> Result<GameOutcome, GameError> {
        let room_id = self.open_room(&state).await;
        let mut speed = SpeedTracker::new();
        info!(game = %state.id(), competition = %state.competition(), "game started");

        let (winner, reason) = loop {
            if let (Some(winner), Some(reason)) = (state.winner(), state.end_reason()) {
                break (winner, reason);
            }
            if let Err(err) = self.play_turn(&mut state, &mut speed).await {
                warn!(game = %state.id(), error = %err, "game aborted");
                if let Some(id) = &room_id {
                    if let Err(e) = self.transcript.delete_room(id).await {
                        warn!(room_id = %id, error = %e, "failed to delete room");
                    }
                }
                return Err(err);
            }
            self.publish(room_id.as_deref(), &state).await;
        };

        let mut rewards = base_rewards(winner, reason);
        if self.speed_modifier {
            rewards = speed.apply(&rewards);
        }

        Ok(GameOutcome {
            room_id: room_id.unwrap_or_else(|| state.id().to_string()),
            competition: state.competition(),
            roster: state.roster().clone(),
            winner,
            reason,
            rewards,
            started_at: state.started_at(),
            ended_at: clock::now(),
            turns: state.turns(),
        })
    }

    async fn play_turn(&self, state: &mut GameState, speed: &mut SpeedTracker) -> Result<(), GameError> {
        let seat = state.current_seat();
        let view = TurnView::for_current(state);
        if seat.role == Role::Operative {
            state.clear_recent();
        }

        let occupant = state.occupant(seat).clone();
        let response = self.ask(&occupant, seat, &view, speed).await;
        let Some(response) = response else {
            state.record_miss(MissKind::NoResponse)?;
            return Ok(());
        };

        match seat.role {
            Role::Spymaster => self.apply_clue(state, &occupant, &view, response).await,
            Role::Operative => {
                let Some(guesses) = response.parsed_guesses() else {
                    state.record_miss(MissKind::NoResponse)?;
                    return Ok(());
                };
                let report = state.apply_guesses(&guesses, response.reasoning)?;
                debug!(
                    seat = %seat,
                    revealed = report.revealed.len(),
                    skipped = report.skipped.len(),
                    truncated = report.truncated,
                    "guesses applied"
                );
                Ok(())
            }
        }
    }

    async fn apply_clue(
        &self,
        state: &mut GameState,
        occupant: &Occupant,
        view: &TurnView,
        response: TurnResponse,
    ) -> Result<(), GameError> {
        if response.clue_text.is_none() {
            state.record_miss(MissKind::NoResponse)?;
            return Ok(());
        }
        let Some(clue) = response.parsed_clue() else {
            debug!(seat = %state.current_seat(), "clue failed protocol check");
            state.record_miss(MissKind::InvalidClue)?;
            return Ok(());
        };
        if occupant.is_remote() && !self.judge.is_valid(&clue.text, &view.words()).await {
            info!(seat = %state.current_seat(), clue = %clue.text, "clue rejected by judge");
            state.record_miss(MissKind::InvalidClue)?;
            return Ok(());
        }
        state.apply_clue(clue, response.reasoning)
    }

    async fn ask(
        &self,
        occupant: &Occupant,
        seat: Seat,
        view: &TurnView,
        speed: &mut SpeedTracker,
    ) -> Option<TurnResponse> {
        match occupant {
            Occupant::Remote { uid, endpoint, .. } => {
                debug!(uid, seat = %seat, "querying participant");
                let outcome = self.policy.query(self.transport.as_ref(), endpoint, view).await;
                speed.record(seat, outcome.elapsed, outcome.timed_out);
                if outcome.response.is_none() {
                    info!(uid, seat = %seat, attempts = outcome.attempts, "no response from participant");
                }
                outcome.response
            }
            Occupant::Local { .. } => {
                match tokio::time::timeout(self.policy.timeout, self.local.respond(view)).await {
                    Ok(response) => response,
                    Err(_) => {
                        warn!(seat = %seat, "local agent timed out");
                        None
                    }
                }
            }
        }
    }

    async fn open_room(&self, state: &GameState) -> Option<String> {
        let payload = RoomPayload::from_state(&self.validator_key, state);
        match self.transcript.create_room(&payload).await {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(game = %state.id(), error = %err, "failed to create room, continuing without transcript");
                None
            }
        }
    }

    async fn publish(&self, room_id: Option<&str>, state: &GameState) {
        let Some(room_id) = room_id else {
            return;
        };
        let payload = RoomPayload::from_state(&self.validator_key, state);
        if let Err(err) = self.transcript.update_room(room_id, &payload).await {
            warn!(room_id, error = %err, "failed to update room");
        }
    }
}
