//! Full matches through `GameRunner` with scripted collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clue_arena::agents::{AgentTransport, BoardWordJudge, LocalAgent, QueryPolicy, TransportError};
use clue_arena::board::{Board, Card, CardColor};
use clue_arena::core::{Competition, Role, Seat, SeatMap, Team};
use clue_arena::game::{EndReason, GameRunner, GameState, Occupant, TurnResponse, TurnView};
use clue_arena::ledger::ScoreLedger;
use clue_arena::registry::EndpointRef;
use clue_arena::transcript::{RoomPayload, TranscriptError, TranscriptSink};

// =============================================================================
// Scripted collaborators
// =============================================================================

type Script = Box<dyn Fn(&TurnView) -> Option<TurnResponse> + Send + Sync>;

/// Remote agents keyed by endpoint.
#[derive(Default)]
struct ScriptedTransport {
    agents: HashMap<String, Script>,
    queries: AtomicUsize,
}

impl ScriptedTransport {
    fn agent(mut self, endpoint: &str, script: impl Fn(&TurnView) -> Option<TurnResponse> + Send + Sync + 'static) -> Self {
        self.agents.insert(endpoint.to_string(), Box::new(script));
        self
    }
}

#[async_trait]
impl AgentTransport for ScriptedTransport {
    async fn query(
        &self,
        endpoint: &EndpointRef,
        view: &TurnView,
        _timeout: Duration,
    ) -> Result<Option<TurnResponse>, TransportError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        match self.agents.get(endpoint.as_str()) {
            Some(script) => Ok(script(view)),
            None => Err(TransportError::Connection("unknown endpoint".into())),
        }
    }

    async fn ping(&self, endpoint: &EndpointRef, _timeout: Duration) -> Result<bool, TransportError> {
        Ok(self.agents.contains_key(endpoint.as_str()))
    }
}

/// Local player that knows the hidden layout.
struct Cheater {
    colors: HashMap<String, CardColor>,
    clue: &'static str,
}

#[async_trait]
impl LocalAgent for Cheater {
    async fn respond(&self, view: &TurnView) -> Option<TurnResponse> {
        match view.your_role {
            Role::Spymaster => Some(TurnResponse::clue(self.clue, 1)),
            Role::Operative => Some(TurnResponse::guesses(own_words(view, &self.colors))),
        }
    }
}

fn own_words(view: &TurnView, colors: &HashMap<String, CardColor>) -> Vec<String> {
    view.cards
        .iter()
        .filter(|c| !c.is_revealed && colors[&c.word] == CardColor::of_team(view.your_team))
        .map(|c| c.word.clone())
        .collect()
}

#[derive(Default)]
struct RecordingTranscript {
    fail_create: bool,
    created: AtomicUsize,
    updated: AtomicUsize,
    deleted: AtomicUsize,
}

#[async_trait]
impl TranscriptSink for RecordingTranscript {
    async fn create_room(&self, _payload: &RoomPayload) -> Result<String, TranscriptError> {
        if self.fail_create {
            return Err(TranscriptError::MissingRoomId);
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok("room-1".into())
    }

    async fn update_room(&self, _room_id: &str, _payload: &RoomPayload) -> Result<(), TranscriptError> {
        self.updated.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_room(&self, _room_id: &str) -> Result<(), TranscriptError> {
        self.deleted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

fn fixed_cards() -> Vec<Card> {
    let mut cards = Vec::new();
    for i in 0..9 {
        cards.push(Card::new(format!("red{i}"), CardColor::Red));
    }
    for i in 0..8 {
        cards.push(Card::new(format!("blue{i}"), CardColor::Blue));
    }
    for i in 0..7 {
        cards.push(Card::new(format!("by{i}"), CardColor::Bystander));
    }
    cards.push(Card::new("assassin", CardColor::Assassin));
    cards
}

fn colors() -> HashMap<String, CardColor> {
    fixed_cards().into_iter().map(|c| (c.word, c.color)).collect()
}

fn remote(uid: u16) -> Occupant {
    Occupant::Remote {
        uid,
        hotkey: format!("miner{uid}"),
        endpoint: EndpointRef::parse(&format!("agent-{uid}")).unwrap(),
    }
}

fn roster(competition: Competition) -> SeatMap<Occupant> {
    SeatMap::new(|seat: Seat| {
        if !competition.is_remote_seat(seat) {
            return Occupant::local("validator");
        }
        match seat.team {
            Team::Red => remote(1),
            Team::Blue => remote(2),
        }
    })
}

fn game(competition: Competition) -> GameState {
    GameState::new(competition, roster(competition), Board::from_cards(fixed_cards()), 0)
}

fn runner(transport: ScriptedTransport, transcript: Arc<RecordingTranscript>) -> GameRunner {
    let local = Cheater {
        colors: colors(),
        clue: "zebra",
    };
    GameRunner::new(
        Arc::new(transport),
        Arc::new(local),
        Arc::new(BoardWordJudge),
        transcript,
        "validator",
    )
    .with_policy(QueryPolicy {
        attempts: 1,
        timeout: Duration::from_secs(5),
        saturation: Duration::from_secs(1),
    })
}

// =============================================================================
// Clue competition
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_single_turn_sweep() {
    let transport = ScriptedTransport::default()
        .agent("agent-1", |_| Some(TurnResponse::clue("zebra", 9)))
        .agent("agent-2", |_| Some(TurnResponse::clue("yak", 1)));
    let transcript = Arc::new(RecordingTranscript::default());
    let runner = runner(transport, transcript.clone());

    let outcome = runner.run(game(Competition::ClueCompetition)).await.unwrap();

    assert_eq!(outcome.winner, Team::Red);
    assert_eq!(outcome.reason, EndReason::AllRevealed);
    assert_eq!(outcome.room_id, "room-1");
    assert_eq!(outcome.rewards.as_array(), &[1.0, 1.0, 0.0, 0.0]);
    assert_eq!(transcript.created.load(Ordering::SeqCst), 1);
    // clue turn plus guess turn
    assert_eq!(transcript.updated.load(Ordering::SeqCst), 2);
    assert_eq!(transcript.deleted.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_silent_spymaster_forfeits() {
    let transport = ScriptedTransport::default()
        .agent("agent-1", |_| None)
        .agent("agent-2", |_| None);
    let runner = runner(transport, Arc::new(RecordingTranscript::default()));

    let outcome = runner.run(game(Competition::ClueCompetition)).await.unwrap();

    // red warned, blue warned, red forfeits
    assert_eq!(outcome.winner, Team::Blue);
    assert_eq!(outcome.reason, EndReason::NoResponse);
    assert_eq!(outcome.turns, 2);
    assert_eq!(outcome.rewards.as_array(), &[0.0, 0.0, 1.0, 1.0]);
}

#[tokio::test(start_paused = true)]
async fn test_judge_rejection_forfeits_with_penalty() {
    let transport = ScriptedTransport::default()
        .agent("agent-1", |_| Some(TurnResponse::clue("red", 2)))
        .agent("agent-2", |_| Some(TurnResponse::clue("blue", 2)));
    let runner = runner(transport, Arc::new(RecordingTranscript::default()));

    let outcome = runner.run(game(Competition::ClueCompetition)).await.unwrap();

    assert_eq!(outcome.winner, Team::Blue);
    assert_eq!(outcome.reason, EndReason::InvalidClue);
    assert_eq!(outcome.rewards[Seat::RED_SPYMASTER], -1.0);
    assert_eq!(outcome.rewards[Seat::BLUE_SPYMASTER], 1.0);
    assert_eq!(outcome.rewards[Seat::RED_OPERATIVE], 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_clue_is_invalid() {
    let transport = ScriptedTransport::default()
        .agent("agent-1", |_| Some(TurnResponse::clue("two words", 2)))
        .agent("agent-2", |_| Some(TurnResponse::clue("zebra", 0)));
    let runner = runner(transport, Arc::new(RecordingTranscript::default()));

    let outcome = runner.run(game(Competition::ClueCompetition)).await.unwrap();

    assert_eq!(outcome.reason, EndReason::InvalidClue);
    assert_eq!(outcome.winner, Team::Blue);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_agent_counts_as_no_response() {
    let transport = ScriptedTransport::default().agent("agent-2", |_| Some(TurnResponse::clue("yak", 1)));
    let runner = runner(transport, Arc::new(RecordingTranscript::default()));

    let outcome = runner.run(game(Competition::ClueCompetition)).await.unwrap();

    // Red's warning is never cleared, so its second turn forfeits.
    assert_eq!(outcome.winner, Team::Blue);
    assert_eq!(outcome.reason, EndReason::NoResponse);
    assert_eq!(outcome.roster[Seat::BLUE_SPYMASTER].uid(), Some(2));
}

// =============================================================================
// Guess competition
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_assassin_loses_for_guessing_team() {
    let transport = ScriptedTransport::default()
        .agent("agent-1", |_| Some(TurnResponse::guesses(["assassin"])))
        .agent("agent-2", |_| Some(TurnResponse::guesses(["blue0"])));
    let runner = runner(transport, Arc::new(RecordingTranscript::default()));

    let outcome = runner.run(game(Competition::GuessCompetition)).await.unwrap();

    assert_eq!(outcome.winner, Team::Blue);
    assert_eq!(outcome.reason, EndReason::Assassin);
    assert_eq!(outcome.turns, 1);
}

#[tokio::test(start_paused = true)]
async fn test_operative_sees_only_revealed_colours() {
    let transport = ScriptedTransport::default()
        .agent("agent-1", |view| {
            assert_eq!(view.your_role, Role::Operative);
            assert!(view.cards.iter().all(|c| c.is_revealed || c.color.is_none()));
            Some(TurnResponse::guesses(["by0"]))
        })
        .agent("agent-2", |view| {
            let last = view.cards.iter().find(|c| c.word == "by0").unwrap();
            assert_eq!(last.color, Some(CardColor::Bystander));
            Some(TurnResponse::guesses(["assassin"]))
        });
    let runner = runner(transport, Arc::new(RecordingTranscript::default()));

    let outcome = runner.run(game(Competition::GuessCompetition)).await.unwrap();
    assert_eq!(outcome.winner, Team::Red);
    assert_eq!(outcome.reason, EndReason::Assassin);
}

// =============================================================================
// Transcript and ledger
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_transcript_failure_does_not_stop_game() {
    let transport = ScriptedTransport::default()
        .agent("agent-1", |_| Some(TurnResponse::clue("zebra", 9)))
        .agent("agent-2", |_| Some(TurnResponse::clue("yak", 1)));
    let transcript = Arc::new(RecordingTranscript {
        fail_create: true,
        ..RecordingTranscript::default()
    });
    let runner = runner(transport, transcript.clone());
    let state = game(Competition::ClueCompetition);
    let game_id = state.id().to_string();

    let outcome = runner.run(state).await.unwrap();

    assert_eq!(outcome.room_id, game_id);
    assert_eq!(transcript.updated.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_outcome_recorded_in_ledger() {
    let transport = ScriptedTransport::default()
        .agent("agent-1", |_| Some(TurnResponse::clue("zebra", 9)))
        .agent("agent-2", |_| Some(TurnResponse::clue("yak", 1)));
    let runner = runner(transport, Arc::new(RecordingTranscript::default()));
    let outcome = runner.run(game(Competition::ClueCompetition)).await.unwrap();

    let ledger = ScoreLedger::open_in_memory(Competition::ClueCompetition, "validator").unwrap();
    ledger.record_game(&outcome.to_record()).unwrap();

    let pending = ledger.pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].hotkeys[Seat::RED_SPYMASTER], "miner1");
    assert_eq!(pending[0].hotkeys[Seat::RED_OPERATIVE], "validator");
    assert_eq!(pending[0].winner, Some(Team::Red));
    assert_eq!(pending[0].reason, Some(EndReason::AllRevealed));
}
