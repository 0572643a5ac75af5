//! Room payloads mirroring a game for spectators.

use serde::{Deserialize, Serialize};

use crate::board::CardColor;
use crate::core::{Competition, Role, Team};
use crate::game::GameState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCard {
    pub word: String,
    pub color: CardColor,
    pub is_revealed: bool,
    pub was_recently_revealed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomChat {
    pub sender: Role,
    pub message: String,
    pub team: Team,
    pub clue_text: Option<String>,
    pub number: Option<u32>,
    pub guesses: Option<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomClue {
    pub clue_text: String,
    pub number: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomParticipant {
    pub name: String,
    pub hot_key: String,
    pub team: Team,
    pub role: Role,
}

/// Full room document, sent on create and on every update.
///
/// Spectators see every colour; the room is never shown to players.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub validator_key: String,
    pub competition: Competition,
    pub cards: Vec<RoomCard>,
    pub chat_history: Vec<RoomChat>,
    pub current_team: Team,
    pub current_role: Role,
    pub previous_team: Option<Team>,
    pub previous_role: Option<Role>,
    pub remaining_red: u8,
    pub remaining_blue: u8,
    pub current_clue: Option<RoomClue>,
    pub current_guesses: Vec<String>,
    pub game_winner: Option<Team>,
    pub participants: Vec<RoomParticipant>,
}

impl RoomPayload {
    /// Snapshot `state` as seen by spectators.
    #[must_use]
    pub fn from_state(validator_key: &str, state: &GameState) -> Self {
        let previous = state.previous_seat();
        Self {
            validator_key: validator_key.to_string(),
            competition: state.competition(),
            cards: state
                .board()
                .cards()
                .map(|c| RoomCard {
                    word: c.word.clone(),
                    color: c.color,
                    is_revealed: c.is_revealed,
                    was_recently_revealed: c.was_recently_revealed,
                })
                .collect(),
            chat_history: state
                .chat()
                .map(|m| RoomChat {
                    sender: m.sender,
                    message: m.message.clone(),
                    team: m.team,
                    clue_text: m.clue_text.clone(),
                    number: m.number,
                    guesses: m.guesses.clone(),
                })
                .collect(),
            current_team: state.current_team(),
            current_role: state.current_role(),
            previous_team: previous.map(|s| s.team),
            previous_role: previous.map(|s| s.role),
            remaining_red: state.remaining(Team::Red),
            remaining_blue: state.remaining(Team::Blue),
            current_clue: state.clue().map(|c| RoomClue {
                clue_text: c.text.clone(),
                number: c.number,
            }),
            current_guesses: state.guesses().to_vec(),
            game_winner: state.winner(),
            participants: state
                .roster()
                .iter()
                .map(|(seat, occupant)| RoomParticipant {
                    name: occupant.display_name(),
                    hot_key: occupant.hotkey().to_string(),
                    team: seat.team,
                    role: seat.role,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, WordList};
    use crate::core::{GameRng, SeatMap};
    use crate::game::{Clue, Occupant};

    #[test]
    fn test_camel_case_fields() {
        let board = Board::generate(&WordList::default(), &mut GameRng::new(4)).unwrap();
        let mut state = GameState::new(
            Competition::GuessCompetition,
            SeatMap::with_value(Occupant::local("5Val")),
            board,
            0,
        );
        state.apply_clue(Clue::new("metal", 2), Some("iron and gold".into())).unwrap();

        let json = serde_json::to_value(RoomPayload::from_state("5Val", &state)).unwrap();
        assert_eq!(json["validatorKey"], "5Val");
        assert_eq!(json["currentRole"], "operative");
        assert_eq!(json["previousRole"], "spymaster");
        assert_eq!(json["currentClue"]["clueText"], "metal");
        assert_eq!(json["cards"].as_array().unwrap().len(), 25);
        assert!(json["cards"][0]["isRevealed"].is_boolean());
        assert_eq!(json["participants"][0]["hotKey"], "5Val");
        assert_eq!(json["chatHistory"][0]["message"], "iron and gold");
        assert!(json["gameWinner"].is_null());
    }
}
