//! Board layout and reveal rules.
//!
//! A board is 25 tiles: 9 red, 8 blue, 7 bystanders and 1 assassin. Red
//! always opens, so it gets the extra tile. Tiles use an `im::Vector` so
//! snapshots handed to the transcript are O(1) clones.

use im::Vector;
use serde::{Deserialize, Serialize};

use super::card::{Card, CardColor, CardView};
use super::words::WordList;
use super::BoardError;
use crate::core::{GameRng, Team};

pub const RED_CARDS: usize = 9;
pub const BLUE_CARDS: usize = 8;
pub const BYSTANDER_CARDS: usize = 7;
pub const ASSASSIN_CARDS: usize = 1;
pub const BOARD_SIZE: usize = RED_CARDS + BLUE_CARDS + BYSTANDER_CARDS + ASSASSIN_CARDS;

/// Result of revealing one tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RevealOutcome {
    pub index: usize,
    pub color: CardColor,
}

/// Ordered tiles plus remaining-tile counters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cards: Vector<Card>,
    remaining_red: u8,
    remaining_blue: u8,
}

impl Board {
    /// Draw 25 distinct words and shuffle the colour layout.
    pub fn generate(words: &WordList, rng: &mut GameRng) -> Result<Self, BoardError> {
        if words.len() < BOARD_SIZE {
            return Err(BoardError::NotEnoughWords {
                needed: BOARD_SIZE,
                available: words.len(),
            });
        }

        let picked = rng.sample(words.as_slice(), BOARD_SIZE);
        let mut colors: Vec<CardColor> = std::iter::repeat(CardColor::Red)
            .take(RED_CARDS)
            .chain(std::iter::repeat(CardColor::Blue).take(BLUE_CARDS))
            .chain(std::iter::repeat(CardColor::Bystander).take(BYSTANDER_CARDS))
            .chain(std::iter::repeat(CardColor::Assassin).take(ASSASSIN_CARDS))
            .collect();
        rng.shuffle(&mut colors);

        let cards = picked
            .into_iter()
            .zip(colors)
            .map(|(word, color)| Card::new(word, color))
            .collect();
        Ok(Self::from_cards(cards))
    }

    /// Build from explicit tiles. Counters are derived from unrevealed tiles.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        let count = |color| {
            cards
                .iter()
                .filter(|c| c.color == color && !c.is_revealed)
                .count() as u8
        };
        let remaining_red = count(CardColor::Red);
        let remaining_blue = count(CardColor::Blue);
        Self {
            cards: cards.into_iter().collect(),
            remaining_red,
            remaining_blue,
        }
    }

    /// Tiles in board order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// Tile at `index`.
    #[must_use]
    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Every word on the board, in order.
    #[must_use]
    pub fn words(&self) -> Vec<String> {
        self.cards.iter().map(|c| c.word.clone()).collect()
    }

    /// Unrevealed tiles left for `team`.
    #[must_use]
    pub fn remaining(&self, team: Team) -> u8 {
        match team {
            Team::Red => self.remaining_red,
            Team::Blue => self.remaining_blue,
        }
    }

    /// Index of the unrevealed tile matching `guess` (trimmed, case-insensitive).
    #[must_use]
    pub fn find_unrevealed(&self, guess: &str) -> Option<usize> {
        let needle = guess.trim();
        self.cards
            .iter()
            .position(|c| !c.is_revealed && c.word.eq_ignore_ascii_case(needle))
    }

    /// Reveal the tile at `index`, decrementing its team counter.
    ///
    /// Returns `None` if the index is out of range or already revealed; the
    /// counters are never touched twice for the same tile.
    pub fn reveal(&mut self, index: usize) -> Option<RevealOutcome> {
        let card = self.cards.get_mut(index)?;
        if card.is_revealed {
            return None;
        }
        card.is_revealed = true;
        card.was_recently_revealed = true;
        let color = card.color;
        match color {
            CardColor::Red => self.remaining_red = self.remaining_red.saturating_sub(1),
            CardColor::Blue => self.remaining_blue = self.remaining_blue.saturating_sub(1),
            CardColor::Bystander | CardColor::Assassin => {}
        }
        Some(RevealOutcome { index, color })
    }

    /// Clear every just-revealed marker.
    pub fn clear_recent(&mut self) {
        for card in self.cards.iter_mut() {
            card.was_recently_revealed = false;
        }
    }

    /// Full board, as a spymaster sees it.
    #[must_use]
    pub fn spymaster_view(&self) -> Vec<CardView> {
        self.cards.iter().map(|c| c.view(true)).collect()
    }

    /// Board with unrevealed colours hidden, as an operative sees it.
    #[must_use]
    pub fn operative_view(&self) -> Vec<CardView> {
        self.cards.iter().map(|c| c.view(false)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(seed: u64) -> Board {
        Board::generate(&WordList::default(), &mut GameRng::new(seed)).unwrap()
    }

    #[test]
    fn test_layout_counts() {
        let b = board(42);
        assert_eq!(b.len(), BOARD_SIZE);

        let count = |color| b.cards().filter(|c| c.color == color).count();
        assert_eq!(count(CardColor::Red), 9);
        assert_eq!(count(CardColor::Blue), 8);
        assert_eq!(count(CardColor::Bystander), 7);
        assert_eq!(count(CardColor::Assassin), 1);
        assert_eq!(b.remaining(Team::Red), 9);
        assert_eq!(b.remaining(Team::Blue), 8);
    }

    #[test]
    fn test_words_distinct() {
        let mut words = board(7).words();
        words.sort();
        words.dedup();
        assert_eq!(words.len(), BOARD_SIZE);
    }

    #[test]
    fn test_same_seed_same_board() {
        assert_eq!(board(5), board(5));
        assert_ne!(board(5), board(6));
    }

    #[test]
    fn test_not_enough_words() {
        let words = WordList::from_text("a\nb\nc");
        let err = Board::generate(&words, &mut GameRng::new(1)).unwrap_err();
        assert_eq!(err, BoardError::NotEnoughWords { needed: 25, available: 3 });
    }

    #[test]
    fn test_reveal_decrements_once() {
        let mut b = board(1);
        let idx = b.cards().position(|c| c.color == CardColor::Red).unwrap();

        let outcome = b.reveal(idx).unwrap();
        assert_eq!(outcome.color, CardColor::Red);
        assert_eq!(b.remaining(Team::Red), 8);

        assert_eq!(b.reveal(idx), None);
        assert_eq!(b.remaining(Team::Red), 8);
        assert!(b.card(idx).unwrap().was_recently_revealed);

        b.clear_recent();
        assert!(!b.card(idx).unwrap().was_recently_revealed);
    }

    #[test]
    fn test_find_unrevealed_case_insensitive() {
        let mut b = board(3);
        let word = b.card(4).unwrap().word.clone();

        assert_eq!(b.find_unrevealed(&format!("  {}  ", word.to_uppercase())), Some(4));
        b.reveal(4);
        assert_eq!(b.find_unrevealed(&word), None);
    }

    #[test]
    fn test_operative_view_hides_colors() {
        let mut b = board(9);
        b.reveal(0);

        let view = b.operative_view();
        assert!(view[0].color.is_some());
        assert!(view[1..].iter().all(|c| c.color.is_none()));
        assert!(b.spymaster_view().iter().all(|c| c.color.is_some()));
    }
}
