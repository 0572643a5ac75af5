//! Board tiles.

use serde::{Deserialize, Serialize};

use crate::core::Team;

/// Hidden colour of a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    Red,
    Blue,
    Bystander,
    Assassin,
}

impl CardColor {
    /// The team owning this colour, if any.
    #[must_use]
    pub const fn team(self) -> Option<Team> {
        match self {
            CardColor::Red => Some(Team::Red),
            CardColor::Blue => Some(Team::Blue),
            CardColor::Bystander | CardColor::Assassin => None,
        }
    }

    /// Colour belonging to `team`.
    #[must_use]
    pub const fn of_team(team: Team) -> Self {
        match team {
            Team::Red => CardColor::Red,
            Team::Blue => CardColor::Blue,
        }
    }
}

/// One tile on the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub word: String,
    pub color: CardColor,
    pub is_revealed: bool,

    /// Set on reveal, cleared before the next operative looks at the board.
    pub was_recently_revealed: bool,
}

impl Card {
    /// A face-down tile.
    pub fn new(word: impl Into<String>, color: CardColor) -> Self {
        Self {
            word: word.into(),
            color,
            is_revealed: false,
            was_recently_revealed: false,
        }
    }

    /// This tile as seen by a viewer; `full` exposes hidden colours.
    #[must_use]
    pub fn view(&self, full: bool) -> CardView {
        CardView {
            word: self.word.clone(),
            color: (full || self.is_revealed).then_some(self.color),
            is_revealed: self.is_revealed,
            was_recently_revealed: self.was_recently_revealed,
        }
    }
}

/// A tile as sent to an agent. `color` is `None` when hidden from the viewer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub word: String,
    pub color: Option<CardColor>,
    pub is_revealed: bool,
    pub was_recently_revealed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_team() {
        assert_eq!(CardColor::Red.team(), Some(Team::Red));
        assert_eq!(CardColor::Assassin.team(), None);
        assert_eq!(CardColor::of_team(Team::Blue), CardColor::Blue);
    }

    #[test]
    fn test_view_hides_unrevealed() {
        let mut card = Card::new("apple", CardColor::Assassin);
        assert_eq!(card.view(false).color, None);
        assert_eq!(card.view(true).color, Some(CardColor::Assassin));

        card.is_revealed = true;
        assert_eq!(card.view(false).color, Some(CardColor::Assassin));
    }
}
