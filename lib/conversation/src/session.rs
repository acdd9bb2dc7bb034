//! Conversation session management.
//!
//! A [`SessionContext`] holds everything one client owns: the active
//! conversation, its session id, and the bounded archive of earlier ones.
//! Every operation takes the context explicitly; nothing is process-wide.
//! None of these operations can fail.

use crate::history::{HistoryEntry, HistoryStore};
use crate::turn::{Conversation, Turn};
use ploughman_core::SessionId;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The active conversation plus the archive it rolls into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    session_id: SessionId,
    conversation: Conversation,
    history: HistoryStore,
}

impl SessionContext {
    /// Creates a context with a fresh session and an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the active session.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// The active conversation.
    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// The archive of earlier conversations.
    #[must_use]
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Begins a new conversation.
    ///
    /// A non-empty active conversation is archived first; a full archive
    /// drops its oldest entry to make room. Always switches to a new session
    /// id that no reachable conversation uses, and returns it.
    pub fn start_new_session(&mut self) -> &SessionId {
        let previous = std::mem::take(&mut self.conversation);
        if !previous.is_empty() {
            self.history.archive(self.session_id.clone(), previous);
        }

        let history = &self.history;
        let current = &self.session_id;
        let fresh = SessionId::generate_unused(|c| c == current || history.contains(c));
        debug!(previous = %self.session_id, next = %fresh, "started new session");
        self.session_id = fresh;
        &self.session_id
    }

    /// Loads the archived conversation at `index` into the active slot.
    ///
    /// An out-of-range index loads an empty conversation. The active session
    /// id is kept, and the replaced conversation is not archived.
    pub fn load_history(&mut self, index: isize) -> &Conversation {
        self.conversation = self.history.select(index);
        &self.conversation
    }

    /// Deletes the archived entry at `index`; out of range is a no-op.
    pub fn delete_history(&mut self, index: isize) -> Option<HistoryEntry> {
        self.history.delete(index)
    }

    /// Discards the active conversation without archiving it.
    pub fn clear_current(&mut self) {
        self.conversation = Conversation::new();
    }

    /// Discards every archived conversation.
    pub fn clear_all(&mut self) {
        self.history.clear();
    }

    /// Appends a turn to the active conversation.
    pub fn append_turn(
        &mut self,
        utterance: impl Into<String>,
        response: impl Into<String>,
    ) -> &Turn {
        self.conversation.append_turn(utterance, response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MAX_HISTORY;

    fn chat(context: &mut SessionContext, utterance: &str) {
        context.append_turn(utterance, format!("answer to {utterance}"));
    }

    #[test]
    fn new_context_is_empty() {
        let context = SessionContext::new();
        assert!(context.conversation().is_empty());
        assert!(context.history().is_empty());
    }

    #[test]
    fn start_new_session_archives_non_empty_conversation() {
        let mut context = SessionContext::new();
        let first_id = context.session_id().clone();
        chat(&mut context, "hello");
        chat(&mut context, "again");
        let archived = context.conversation().clone();

        let next_id = context.start_new_session().clone();

        assert_ne!(next_id, first_id);
        assert!(context.conversation().is_empty());
        assert_eq!(context.history().len(), 1);
        let entry = context.history().get(0).expect("archived");
        assert_eq!(entry.session_id(), &first_id);
        assert_eq!(entry.conversation(), &archived);
        assert_eq!(entry.preview(), "hello");
    }

    #[test]
    fn start_new_session_with_empty_conversation_archives_nothing() {
        let mut context = SessionContext::new();
        let first_id = context.session_id().clone();

        context.start_new_session();

        assert!(context.history().is_empty());
        assert_ne!(context.session_id(), &first_id);
    }

    #[test]
    fn six_sessions_evict_the_first() {
        let mut context = SessionContext::new();
        for k in 1..=6 {
            chat(&mut context, &format!("msg{k}"));
            context.start_new_session();
            assert!(context.history().len() <= MAX_HISTORY);
        }

        let previews: Vec<_> = context
            .history()
            .summaries()
            .into_iter()
            .map(|s| s.preview)
            .collect();
        assert_eq!(previews, ["msg2", "msg3", "msg4", "msg5", "msg6"]);
    }

    #[test]
    fn session_ids_are_unique_across_archive() {
        let mut context = SessionContext::new();
        for k in 0..MAX_HISTORY {
            chat(&mut context, &format!("m{k}"));
            context.start_new_session();
        }

        let mut ids: Vec<_> = context
            .history()
            .iter()
            .map(|e| e.session_id().clone())
            .collect();
        ids.push(context.session_id().clone());
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn load_history_replaces_active_conversation() {
        let mut context = SessionContext::new();
        chat(&mut context, "archived question");
        context.start_new_session();
        chat(&mut context, "current question");

        let loaded = context.load_history(0).clone();

        assert_eq!(loaded.first_utterance(), Some("archived question"));
        assert_eq!(context.conversation(), &loaded);
        assert_eq!(context.history().len(), 1);
    }

    // Legacy-compatible behaviour: an out-of-range selection clears the
    // active conversation instead of raising an error.
    #[test]
    fn load_history_out_of_range_clears_active_conversation() {
        let mut context = SessionContext::new();
        chat(&mut context, "something");

        assert!(context.load_history(3).is_empty());
        assert!(context.conversation().is_empty());
    }

    #[test]
    fn delete_then_select_sees_shifted_entry() {
        let mut context = SessionContext::new();
        for u in ["a", "b", "c"] {
            chat(&mut context, u);
            context.start_new_session();
        }
        let third = context.history().select(2);

        context.delete_history(1);

        assert_eq!(context.history().select(1), third);
    }

    #[test]
    fn clear_current_does_not_archive() {
        let mut context = SessionContext::new();
        chat(&mut context, "discard me");

        context.clear_current();

        assert!(context.conversation().is_empty());
        assert!(context.history().is_empty());
    }

    #[test]
    fn clear_all_keeps_active_conversation() {
        let mut context = SessionContext::new();
        chat(&mut context, "old");
        context.start_new_session();
        chat(&mut context, "new");

        context.clear_all();

        assert!(context.history().is_empty());
        assert_eq!(context.conversation().first_utterance(), Some("new"));
    }
}
