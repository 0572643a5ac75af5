//! Role-scoped turn views sent to agents.

use serde::{Deserialize, Serialize};

use super::state::{ChatMessage, GameState};
use crate::board::CardView;
use crate::core::{Competition, Role, Team};

/// Everything the acting seat is allowed to see.
///
/// Operatives get `color: None` for every unrevealed tile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnView {
    pub competition: Competition,
    pub your_team: Team,
    pub your_role: Role,
    pub remaining_red: u8,
    pub remaining_blue: u8,
    pub your_clue: Option<String>,
    pub your_number: Option<u32>,
    pub cards: Vec<CardView>,
    pub chat_history: Vec<ChatMessage>,
}

impl TurnView {
    /// View for the seat whose turn it is.
    #[must_use]
    pub fn for_current(state: &GameState) -> Self {
        let seat = state.current_seat();
        let board = state.board();
        let cards = match seat.role {
            Role::Spymaster => board.spymaster_view(),
            Role::Operative => board.operative_view(),
        };
        let clue = state.clue();

        Self {
            competition: state.competition(),
            your_team: seat.team,
            your_role: seat.role,
            remaining_red: state.remaining(Team::Red),
            remaining_blue: state.remaining(Team::Blue),
            your_clue: clue.map(|c| c.text.clone()),
            your_number: clue.map(|c| c.number),
            cards,
            chat_history: state.chat().cloned().collect(),
        }
    }

    /// Board words in order.
    #[must_use]
    pub fn words(&self) -> Vec<String> {
        self.cards.iter().map(|c| c.word.clone()).collect()
    }
}
