//! Agent turn responses and their protocol checks.

use serde::{Deserialize, Serialize};

use super::state::Clue;

/// Raw response from an agent.
///
/// Spymasters fill `clue_text` and `number`; operatives fill `guesses`.
/// Anything else is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnResponse {
    #[serde(default)]
    pub clue_text: Option<String>,
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub guesses: Option<Vec<String>>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl TurnResponse {
    /// A spymaster response.
    pub fn clue(text: impl Into<String>, number: i64) -> Self {
        Self {
            clue_text: Some(text.into()),
            number: Some(number),
            ..Self::default()
        }
    }

    /// An operative response.
    pub fn guesses<S: Into<String>>(guesses: impl IntoIterator<Item = S>) -> Self {
        Self {
            guesses: Some(guesses.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    /// The clue, if it is a single non-empty token with a positive number.
    #[must_use]
    pub fn parsed_clue(&self) -> Option<Clue> {
        let text = self.clue_text.as_deref()?.trim();
        if text.is_empty() || text.split_whitespace().count() != 1 {
            return None;
        }
        let number = u32::try_from(self.number?).ok().filter(|n| *n >= 1)?;
        Some(Clue::new(text, number))
    }

    /// Non-empty guesses with blank entries removed.
    #[must_use]
    pub fn parsed_guesses(&self) -> Option<Vec<String>> {
        let guesses: Vec<String> = self
            .guesses
            .as_ref()?
            .iter()
            .map(|g| g.trim())
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();
        (!guesses.is_empty()).then_some(guesses)
    }
}
