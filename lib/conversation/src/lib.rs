//! Conversation state for ploughman.
//!
//! This crate provides:
//!
//! - **Turns**: append-only (utterance, response) sequences
//! - **History store**: bounded FIFO archive of past conversations
//! - **Session context**: the per-client state every session operation takes

pub mod history;
pub mod session;
pub mod turn;

pub use history::{
    HistoryEntry, HistoryStore, HistorySummary, MAX_HISTORY, PREVIEW_ELLIPSIS, PREVIEW_MAX_CHARS,
    preview_of,
};
pub use session::SessionContext;
pub use turn::{Conversation, Turn};
