//! Match state and turn transitions.
//!
//! `GameState` owns everything about one match: the board, whose turn it
//! is, the pending clue, the chat log and the per-seat miss counters. The
//! runner feeds it classified responses through three calls:
//!
//! - [`GameState::apply_clue`] for a valid spymaster turn
//! - [`GameState::apply_guesses`] for an operative turn
//! - [`GameState::record_miss`] for an absent or invalid response
//!
//! Once a winner is set every further mutation returns
//! [`GameError::GameOver`].
//!
//! ## Example
//!
//! ```
//! use clue_arena::board::{Board, WordList};
//! use clue_arena::core::{Competition, GameRng, Role, SeatMap, Team};
//! use clue_arena::game::{Clue, GameState, Occupant};
//!
//! let board = Board::generate(&WordList::default(), &mut GameRng::new(1)).unwrap();
//! let roster = SeatMap::with_value(Occupant::local("validator"));
//! let mut game = GameState::new(Competition::ClueCompetition, roster, board, 60);
//!
//! game.apply_clue(Clue::new("ocean", 2), None).unwrap();
//! assert_eq!(game.current_role(), Role::Operative);
//! assert_eq!(game.current_team(), Team::Red);
//! ```

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::error::{GameError, GameResult};
use crate::board::{Board, CardColor, RevealOutcome, WordList};
use crate::core::{clock, Competition, GameRng, Role, Seat, SeatMap, Team, Timestamp};
use crate::registry::EndpointRef;

/// Misses a seat may accumulate before its team forfeits.
pub const MISSES_BEFORE_FORFEIT: u8 = 2;

/// Who plays a seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Occupant {
    /// A selected participant reached through the agent transport.
    Remote {
        uid: u16,
        hotkey: String,
        endpoint: EndpointRef,
    },
    /// The local fallback agent, recorded under the validator's hotkey.
    Local { hotkey: String },
}

impl Occupant {
    /// Local fallback occupant.
    pub fn local(hotkey: impl Into<String>) -> Self {
        Occupant::Local {
            hotkey: hotkey.into(),
        }
    }

    #[must_use]
    pub fn hotkey(&self) -> &str {
        match self {
            Occupant::Remote { hotkey, .. } | Occupant::Local { hotkey } => hotkey,
        }
    }

    #[must_use]
    pub fn uid(&self) -> Option<u16> {
        match self {
            Occupant::Remote { uid, .. } => Some(*uid),
            Occupant::Local { .. } => None,
        }
    }

    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Occupant::Remote { .. })
    }

    /// Name shown in transcripts.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Occupant::Remote { uid, .. } => format!("Miner {uid}"),
            Occupant::Local { .. } => "Validator".to_string(),
        }
    }
}

/// A spymaster's clue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    pub text: String,
    pub number: u32,
}

impl Clue {
    pub fn new(text: impl Into<String>, number: u32) -> Self {
        Self {
            text: text.into(),
            number,
        }
    }

    /// Guesses an operative may spend on this clue.
    #[must_use]
    pub fn max_guesses(&self) -> usize {
        self.number as usize + 1
    }
}

/// One entry in the match chat log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub team: Team,
    pub sender: Role,
    pub message: String,
    pub clue_text: Option<String>,
    pub number: Option<u32>,
    pub guesses: Option<Vec<String>>,
}

/// Why a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A team found all of its tiles.
    AllRevealed,
    /// The assassin was revealed.
    Assassin,
    /// Forfeit after repeated missing responses.
    NoResponse,
    /// Forfeit after repeated rejected clues.
    InvalidClue,
    /// The turn limit was reached.
    TurnLimit,
}

impl EndReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EndReason::AllRevealed => "all_revealed",
            EndReason::Assassin => "assassin",
            EndReason::NoResponse => "no_response",
            EndReason::InvalidClue => "invalid_clue",
            EndReason::TurnLimit => "turn_limit",
        }
    }

    /// Parse a stored name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        [
            EndReason::AllRevealed,
            EndReason::Assassin,
            EndReason::NoResponse,
            EndReason::InvalidClue,
            EndReason::TurnLimit,
        ]
        .into_iter()
        .find(|r| r.as_str() == value)
    }
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cause of a missed turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissKind {
    NoResponse,
    InvalidClue,
}

impl From<MissKind> for EndReason {
    fn from(kind: MissKind) -> Self {
        match kind {
            MissKind::NoResponse => EndReason::NoResponse,
            MissKind::InvalidClue => EndReason::InvalidClue,
        }
    }
}

/// What a recorded miss led to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissOutcome {
    /// The seat is on its last warning; play passes to the other team.
    Warning,
    /// The seat's team forfeited.
    Forfeit,
}

/// What an operative turn did to the board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuessReport {
    /// Tiles revealed, in order.
    pub revealed: Vec<RevealOutcome>,
    /// Guesses that matched no unrevealed tile.
    pub skipped: Vec<String>,
    /// Guesses dropped because they exceeded the clue number plus one.
    pub truncated: usize,
}

/// State of one match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    id: Uuid,
    competition: Competition,
    board: Board,
    chat: Vector<ChatMessage>,
    current: Seat,
    previous: Option<Seat>,
    clue: Option<Clue>,
    guesses: Vec<String>,
    winner: Option<Team>,
    end_reason: Option<EndReason>,
    roster: SeatMap<Occupant>,
    misses: SeatMap<u8>,
    turns: u32,
    max_turns: u32,
    started_at: Timestamp,
}

impl GameState {
    /// Start a match on `board`. Red's spymaster opens.
    ///
    /// `max_turns` of 0 disables the turn limit.
    pub fn new(
        competition: Competition,
        roster: SeatMap<Occupant>,
        board: Board,
        max_turns: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            competition,
            board,
            chat: Vector::new(),
            current: Seat::RED_SPYMASTER,
            previous: None,
            clue: None,
            guesses: Vec::new(),
            winner: None,
            end_reason: None,
            roster,
            misses: SeatMap::with_value(0),
            turns: 0,
            max_turns,
            started_at: clock::now(),
        }
    }

    /// Start a match on a freshly generated board.
    pub fn generate(
        competition: Competition,
        roster: SeatMap<Occupant>,
        words: &WordList,
        rng: &mut GameRng,
        max_turns: u32,
    ) -> GameResult<Self> {
        let board = Board::generate(words, rng)?;
        Ok(Self::new(competition, roster, board, max_turns))
    }

    // === Accessors ===

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn competition(&self) -> Competition {
        self.competition
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn chat(&self) -> impl Iterator<Item = &ChatMessage> {
        self.chat.iter()
    }

    /// Seat whose turn it is.
    #[must_use]
    pub fn current_seat(&self) -> Seat {
        self.current
    }

    #[must_use]
    pub fn current_team(&self) -> Team {
        self.current.team
    }

    #[must_use]
    pub fn current_role(&self) -> Role {
        self.current.role
    }

    /// Seat that acted last, if any.
    #[must_use]
    pub fn previous_seat(&self) -> Option<Seat> {
        self.previous
    }

    #[must_use]
    pub fn clue(&self) -> Option<&Clue> {
        self.clue.as_ref()
    }

    /// Guesses of the latest operative turn.
    #[must_use]
    pub fn guesses(&self) -> &[String] {
        &self.guesses
    }

    #[must_use]
    pub fn remaining(&self, team: Team) -> u8 {
        self.board.remaining(team)
    }

    #[must_use]
    pub fn winner(&self) -> Option<Team> {
        self.winner
    }

    #[must_use]
    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    #[must_use]
    pub fn roster(&self) -> &SeatMap<Occupant> {
        &self.roster
    }

    #[must_use]
    pub fn occupant(&self, seat: Seat) -> &Occupant {
        &self.roster[seat]
    }

    #[must_use]
    pub fn misses(&self, seat: Seat) -> u8 {
        self.misses[seat]
    }

    /// Completed transitions so far.
    #[must_use]
    pub fn turns(&self) -> u32 {
        self.turns
    }

    #[must_use]
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    // === Transitions ===

    /// Clear just-revealed markers. Called before an operative looks at the board.
    pub fn clear_recent(&mut self) {
        self.board.clear_recent();
    }

    /// Apply a valid clue from the current spymaster.
    pub fn apply_clue(&mut self, clue: Clue, reasoning: Option<String>) -> GameResult<()> {
        self.ensure_turn(Role::Spymaster)?;

        debug!(team = %self.current.team, clue = %clue.text, number = clue.number, "clue given");
        self.chat.push_back(ChatMessage {
            team: self.current.team,
            sender: Role::Spymaster,
            message: reasoning.unwrap_or_default(),
            clue_text: Some(clue.text.clone()),
            number: Some(clue.number),
            guesses: None,
        });
        self.misses[self.current] = 0;
        self.clue = Some(clue);
        self.guesses.clear();

        self.advance(Seat::new(self.current.team, Role::Operative));
        Ok(())
    }

    /// Apply an operative's guesses in order.
    ///
    /// Guesses beyond the clue number plus one are dropped. Unknown or
    /// already revealed words are skipped. The turn stops at the first
    /// off-team tile, the assassin, or when either team runs out of tiles.
    pub fn apply_guesses(
        &mut self,
        guesses: &[String],
        reasoning: Option<String>,
    ) -> GameResult<GuessReport> {
        self.ensure_turn(Role::Operative)?;

        let team = self.current.team;
        let limit = self.clue.as_ref().map_or(guesses.len(), Clue::max_guesses);
        let mut report = GuessReport {
            truncated: guesses.len().saturating_sub(limit),
            ..GuessReport::default()
        };
        let taken = &guesses[..guesses.len().min(limit)];

        for guess in taken {
            let Some(index) = self.board.find_unrevealed(guess) else {
                debug!(guess = %guess, "guess matches no unrevealed tile");
                report.skipped.push(guess.clone());
                continue;
            };
            let Some(outcome) = self.board.reveal(index) else {
                continue;
            };
            report.revealed.push(outcome);

            if let Some(done) = Team::all().find(|t| self.board.remaining(*t) == 0) {
                self.finish(done, EndReason::AllRevealed);
                break;
            }
            if outcome.color == CardColor::Assassin {
                self.finish(team.other(), EndReason::Assassin);
                break;
            }
            if outcome.color != CardColor::of_team(team) {
                break;
            }
        }

        self.chat.push_back(ChatMessage {
            team,
            sender: Role::Operative,
            message: reasoning.unwrap_or_default(),
            clue_text: None,
            number: None,
            guesses: Some(taken.to_vec()),
        });
        self.guesses = taken.to_vec();
        self.misses[self.current] = 0;

        if !self.is_over() {
            self.advance(Seat::new(team.other(), Role::Spymaster));
        }
        Ok(report)
    }

    /// Record a missing or invalid response from the current seat.
    ///
    /// The first miss is a warning and passes play to the other team's
    /// seat of the same role. The second consecutive miss forfeits.
    pub fn record_miss(&mut self, kind: MissKind) -> GameResult<MissOutcome> {
        if let Some(winner) = self.winner {
            return Err(GameError::GameOver { winner });
        }

        let seat = self.current;
        self.misses[seat] += 1;
        if self.misses[seat] >= MISSES_BEFORE_FORFEIT {
            info!(seat = %seat, reason = ?kind, "seat forfeited");
            self.finish(seat.team.other(), kind.into());
            return Ok(MissOutcome::Forfeit);
        }

        info!(seat = %seat, reason = ?kind, "missed turn, warning issued");
        self.clue = None;
        self.advance(Seat::new(seat.team.other(), seat.role));
        Ok(MissOutcome::Warning)
    }

    fn ensure_turn(&self, role: Role) -> GameResult<()> {
        if let Some(winner) = self.winner {
            return Err(GameError::GameOver { winner });
        }
        if self.current.role != role {
            return Err(GameError::WrongRole {
                expected: role,
                actual: self.current.role,
            });
        }
        Ok(())
    }

    fn advance(&mut self, next: Seat) {
        self.previous = Some(self.current);
        self.current = next;
        self.turns += 1;

        if self.max_turns > 0 && self.turns >= self.max_turns {
            let red = self.board.remaining(Team::Red);
            let blue = self.board.remaining(Team::Blue);
            let winner = match red.cmp(&blue) {
                std::cmp::Ordering::Less => Team::Red,
                std::cmp::Ordering::Greater => Team::Blue,
                std::cmp::Ordering::Equal => self.current.team.other(),
            };
            self.finish(winner, EndReason::TurnLimit);
        }
    }

    fn finish(&mut self, winner: Team, reason: EndReason) {
        if self.winner.is_some() {
            return;
        }
        info!(game = %self.id, winner = %winner, reason = %reason, turns = self.turns, "game over");
        self.winner = Some(winner);
        self.end_reason = Some(reason);
        self.board.clear_recent();
    }
}
