//! Conversation turns.
//!
//! A conversation is an append-only sequence of (utterance, response) pairs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One exchange within a conversation.
///
/// Turns compare equal when their utterance and response match; the
/// timestamp is not part of equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// What the user said.
    pub utterance: String,
    /// What the assistant answered.
    pub response: String,
    /// When the turn was appended.
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// Creates a new turn stamped with the current time.
    #[must_use]
    pub fn new(utterance: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            utterance: utterance.into(),
            response: response.into(),
            created_at: Utc::now(),
        }
    }
}

impl PartialEq for Turn {
    fn eq(&self, other: &Self) -> bool {
        self.utterance == other.utterance && self.response == other.response
    }
}

impl Eq for Turn {}

/// An ordered, append-only sequence of turns.
///
/// Turns cannot be edited or removed once appended; the only way to shrink a
/// conversation is to replace it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Creates an empty conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn at the end of the conversation.
    pub fn append_turn(
        &mut self,
        utterance: impl Into<String>,
        response: impl Into<String>,
    ) -> &Turn {
        self.turns.push(Turn::new(utterance, response));
        &self.turns[self.turns.len() - 1]
    }

    /// Returns the turns in conversation order.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the number of turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns whether the conversation has no turns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the utterance of the first turn, if any.
    #[must_use]
    pub fn first_utterance(&self) -> Option<&str> {
        self.turns.first().map(|t| t.utterance.as_str())
    }

    /// Returns the last turn, if any.
    #[must_use]
    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }
}

impl FromIterator<Turn> for Conversation {
    fn from_iter<I: IntoIterator<Item = Turn>>(iter: I) -> Self {
        Self {
            turns: iter.into_iter().collect(),
        }
    }
}
