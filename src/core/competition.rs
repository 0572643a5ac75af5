//! Competition variants.
//!
//! Each competition is an isolated scoring namespace with its own
//! weight-allocation slot (mechanism id). Competitions differ only in which
//! seats the selected participants occupy; the remaining seats are played
//! by the local fallback agent.

use serde::{Deserialize, Serialize};

use super::seat::{Role, Seat};

/// Game variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Competition {
    /// Participants give clues; operatives are local.
    ClueCompetition,
    /// Participants guess; spymasters are local.
    GuessCompetition,
}

impl Competition {
    /// Every competition, in mechanism-id order.
    pub const ALL: [Competition; 2] = [Competition::ClueCompetition, Competition::GuessCompetition];

    /// Wire and namespace name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Competition::ClueCompetition => "clue_competition",
            Competition::GuessCompetition => "guess_competition",
        }
    }

    /// Parse a wire name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }

    /// Weight-allocation slot for this competition.
    #[must_use]
    pub const fn mechanism_id(self) -> u8 {
        match self {
            Competition::ClueCompetition => 0,
            Competition::GuessCompetition => 1,
        }
    }

    /// The role remote participants play.
    #[must_use]
    pub const fn remote_role(self) -> Role {
        match self {
            Competition::ClueCompetition => Role::Spymaster,
            Competition::GuessCompetition => Role::Operative,
        }
    }

    /// Whether `seat` is played by a selected participant.
    #[must_use]
    pub fn is_remote_seat(self, seat: Seat) -> bool {
        seat.role == self.remote_role()
    }
}

impl std::fmt::Display for Competition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for comp in Competition::ALL {
            assert_eq!(Competition::parse(comp.as_str()), Some(comp));
        }
        assert_eq!(Competition::parse("twenty_questions"), None);
    }

    #[test]
    fn test_mechanism_ids_unique() {
        assert_ne!(
            Competition::ClueCompetition.mechanism_id(),
            Competition::GuessCompetition.mechanism_id()
        );
    }

    #[test]
    fn test_remote_seats() {
        let clue = Competition::ClueCompetition;
        assert!(clue.is_remote_seat(Seat::RED_SPYMASTER));
        assert!(!clue.is_remote_seat(Seat::BLUE_OPERATIVE));

        let guess = Competition::GuessCompetition;
        assert!(guess.is_remote_seat(Seat::BLUE_OPERATIVE));
        assert!(!guess.is_remote_seat(Seat::RED_SPYMASTER));
    }

    #[test]
    fn test_serde_name() {
        let json = serde_json::to_string(&Competition::GuessCompetition).unwrap();
        assert_eq!(json, "\"guess_competition\"");
    }
}
