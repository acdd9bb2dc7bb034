//! Bounded archive of past conversations.
//!
//! The store keeps at most [`MAX_HISTORY`] entries. Archiving into a full
//! store evicts the oldest entry (position 0) before appending. Entries are
//! addressed by position; positions shift down after a deletion.

use crate::turn::Conversation;
use chrono::{DateTime, Utc};
use ploughman_core::SessionId;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Maximum number of archived conversations.
pub const MAX_HISTORY: usize = 5;

/// Maximum number of characters kept in a preview before the marker.
pub const PREVIEW_MAX_CHARS: usize = 50;

/// Marker appended to truncated previews.
pub const PREVIEW_ELLIPSIS: &str = "...";

/// Builds the preview shown for an archived conversation.
///
/// Counts characters, not bytes.
#[must_use]
pub fn preview_of(utterance: &str) -> String {
    let mut chars = utterance.chars();
    let head: String = chars.by_ref().take(PREVIEW_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}{PREVIEW_ELLIPSIS}")
    } else {
        head
    }
}

/// An archived, immutable snapshot of a past conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    session_id: SessionId,
    preview: String,
    conversation: Conversation,
    archived_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Snapshots a conversation under the given session id.
    #[must_use]
    pub fn new(session_id: SessionId, conversation: Conversation) -> Self {
        let preview = preview_of(conversation.first_utterance().unwrap_or_default());
        Self {
            session_id,
            preview,
            conversation,
            archived_at: Utc::now(),
        }
    }

    /// The id the conversation had while it was active.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Truncated first utterance.
    #[must_use]
    pub fn preview(&self) -> &str {
        &self.preview
    }

    /// The archived turns.
    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// When the entry was archived.
    #[must_use]
    pub fn archived_at(&self) -> DateTime<Utc> {
        self.archived_at
    }
}

/// One row of the archive listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySummary {
    /// Session id of the archived conversation.
    pub session_id: SessionId,
    /// Preview of its first utterance.
    pub preview: String,
}

/// Ordered archive of past conversations, bounded by [`MAX_HISTORY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
}

/// Keeps only the newest [`MAX_HISTORY`] entries of a stored archive.
impl<'de> Deserialize<'de> for HistoryStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut entries = VecDeque::<HistoryEntry>::deserialize(deserializer)?;
        if entries.len() > MAX_HISTORY {
            debug!(
                stored = entries.len(),
                kept = MAX_HISTORY,
                "dropping oldest history entries on load"
            );
            entries.drain(..entries.len() - MAX_HISTORY);
        }
        Ok(Self { entries })
    }
}

impl HistoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Archives a conversation.
    ///
    /// Empty conversations are not archived. When the store is full the
    /// oldest entry is evicted first and returned.
    pub fn archive(
        &mut self,
        session_id: SessionId,
        conversation: Conversation,
    ) -> Option<HistoryEntry> {
        if conversation.is_empty() {
            return None;
        }

        let evicted = if self.entries.len() >= MAX_HISTORY {
            self.entries.pop_front()
        } else {
            None
        };
        if let Some(ref entry) = evicted {
            debug!(session_id = %entry.session_id, "evicted oldest history entry");
        }

        debug!(%session_id, turns = conversation.len(), "archived conversation");
        self.entries.push_back(HistoryEntry::new(session_id, conversation));
        evicted
    }

    /// Returns the turns of the entry at `index`.
    ///
    /// Out-of-range indices, negative ones included, yield an empty
    /// conversation rather than an error.
    #[must_use]
    pub fn select(&self, index: isize) -> Conversation {
        self.get(index)
            .map(|entry| entry.conversation.clone())
            .unwrap_or_default()
    }

    /// Removes the entry at `index`, keeping the order of the others.
    ///
    /// Out-of-range indices leave the store unchanged.
    pub fn delete(&mut self, index: isize) -> Option<HistoryEntry> {
        let position = self.position(index)?;
        self.entries.remove(position)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the entry at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: isize) -> Option<&HistoryEntry> {
        self.position(index).and_then(|p| self.entries.get(p))
    }

    /// Returns whether an entry was archived under `session_id`.
    #[must_use]
    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.entries.iter().any(|e| &e.session_id == session_id)
    }

    /// Iterates entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Returns `(session_id, preview)` rows, oldest first.
    #[must_use]
    pub fn summaries(&self) -> Vec<HistorySummary> {
        self.entries
            .iter()
            .map(|e| HistorySummary {
                session_id: e.session_id.clone(),
                preview: e.preview.clone(),
            })
            .collect()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, index: isize) -> Option<usize> {
        usize::try_from(index)
            .ok()
            .filter(|&p| p < self.entries.len())
    }
}
