//! Clue legality.

use async_trait::async_trait;

/// Decides whether a clue is legal on a board.
#[async_trait]
pub trait ClueJudge: Send + Sync {
    async fn is_valid(&self, clue: &str, board_words: &[String]) -> bool;
}

/// Rejects clues that are, contain, or are contained in a board word.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoardWordJudge;

#[async_trait]
impl ClueJudge for BoardWordJudge {
    async fn is_valid(&self, clue: &str, board_words: &[String]) -> bool {
        let clue = clue.trim().to_lowercase();
        if clue.is_empty() || !clue.chars().all(char::is_alphabetic) {
            return false;
        }
        !board_words.iter().any(|word| {
            let word = word.to_lowercase();
            word.contains(&clue) || clue.contains(&word)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Vec<String> {
        ["apple", "bank", "fire"].iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_board_word_rejected() {
        let judge = BoardWordJudge;
        assert!(!judge.is_valid("Apple", &board()).await);
        assert!(!judge.is_valid("firetruck", &board()).await);
        assert!(!judge.is_valid("ban", &board()).await);
    }

    #[tokio::test]
    async fn test_unrelated_word_accepted() {
        let judge = BoardWordJudge;
        assert!(judge.is_valid("orchard", &board()).await);
        assert!(!judge.is_valid("r2d2", &board()).await);
    }
}
