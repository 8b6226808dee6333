use super::turn::{Role, Turn};
use serde::Serialize;

/// How much committed history is handed to the encoder on each turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryWindow {
    #[default]
    Unbounded,
    /// Keep only the last `k` committed exchanges (user + assistant pairs).
    LastExchanges(usize),
}

/// Append-only conversation history owned by a single session.
///
/// The only way to grow the history is [`ConversationState::commit_exchange`],
/// so the length is always twice the number of completed turns and turns
/// alternate user/assistant in creation order.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self { turns: Vec::new() }
    }

    pub(crate) fn commit_exchange(&mut self, user: Turn, assistant: Turn) {
        debug_assert_eq!(user.role(), Role::User);
        debug_assert_eq!(assistant.role(), Role::Assistant);
        self.turns.push(user);
        self.turns.push(assistant);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn completed_exchanges(&self) -> usize {
        self.turns.len() / 2
    }

    /// Committed turns visible under `window`, oldest first.
    pub fn windowed(&self, window: HistoryWindow) -> &[Turn] {
        match window {
            HistoryWindow::Unbounded => &self.turns,
            HistoryWindow::LastExchanges(k) => {
                let keep = k.saturating_mul(2).min(self.turns.len());
                &self.turns[self.turns.len() - keep..]
            }
        }
    }
}
