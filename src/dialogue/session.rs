use super::encoder::Encoder;
use super::state::{ConversationState, HistoryWindow};
use super::turn::Turn;
use super::InferenceBackend;
use crate::{Error, Result};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    InProgress,
    /// All requested turns have been taken. Terminal.
    Done,
}

/// Conversation controller that owns its history exclusively.
pub struct DialogueSession {
    state: ConversationState,
    encoder: Box<dyn Encoder>,
    backend: Box<dyn InferenceBackend>,
    window: HistoryWindow,
    turn_limit: Option<usize>,
}

impl DialogueSession {
    pub fn new(encoder: Box<dyn Encoder>, backend: Box<dyn InferenceBackend>) -> Self {
        Self {
            state: ConversationState::new(),
            encoder,
            backend,
            window: HistoryWindow::Unbounded,
            turn_limit: None,
        }
    }

    pub fn with_window(mut self, window: HistoryWindow) -> Self {
        self.window = window;
        self
    }

    /// Bound the session to `limit` turns; it reaches [`SessionPhase::Done`]
    /// after the last one.
    pub fn with_turn_limit(mut self, limit: usize) -> Self {
        self.turn_limit = Some(limit);
        self
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn turns_taken(&self) -> usize {
        self.state.completed_exchanges()
    }

    pub fn phase(&self) -> SessionPhase {
        let taken = self.turns_taken();
        match self.turn_limit {
            Some(limit) if taken >= limit => SessionPhase::Done,
            _ if taken == 0 => SessionPhase::Idle,
            _ => SessionPhase::InProgress,
        }
    }

    /// Take one turn: send `user_text` with the history to the backend and
    /// commit the exchange.
    ///
    /// On failure nothing is committed and the error is an [`Error::Backend`]
    /// (or [`Error::SessionFinished`] when the turn limit is exhausted).
    pub async fn advance(&mut self, user_text: &str) -> Result<String> {
        if self.phase() == SessionPhase::Done {
            return Err(Error::SessionFinished(self.turns_taken()));
        }

        let user_turn = Turn::user(user_text);
        let mut context_turns = self.state.windowed(self.window).to_vec();
        context_turns.push(user_turn.clone());
        let context = self.encoder.encode(&context_turns);

        debug!(
            "Turn {}: encoded {} of {} history turns",
            self.turns_taken() + 1,
            context_turns.len(),
            self.state.len() + 1
        );

        let raw = self.backend.generate(&context).await.map_err(|e| {
            warn!("Backend failed, turn not committed: {}", e);
            e.into_backend()
        })?;
        let reply = self
            .encoder
            .extract_reply(&context, &raw)
            .map_err(Error::into_backend)?;

        self.state
            .commit_exchange(user_turn, Turn::assistant(reply.clone()));
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::{
        EncodedContext, MessagesEncoder, MockBackend, Role, TranscriptEncoder,
    };

    fn session_with(backend: MockBackend) -> DialogueSession {
        DialogueSession::new(Box::new(MessagesEncoder::new()), Box::new(backend))
    }

    #[tokio::test]
    async fn test_advance_grows_history_by_two_per_turn() {
        let mut session = session_with(MockBackend::new().with_response("OK".to_string()));

        for k in 1..=4 {
            let reply = session.advance(&format!("message {}", k)).await.unwrap();
            assert_eq!(reply, "OK");
            assert_eq!(session.state().len(), 2 * k);
        }
    }

    #[tokio::test]
    async fn test_advance_accepts_empty_input() {
        let mut session = session_with(MockBackend::new().with_response("OK".to_string()));

        session.advance("").await.unwrap();
        assert_eq!(session.state().turns()[0].text(), "");
        assert_eq!(session.state().turns()[0].role(), Role::User);
    }

    #[tokio::test]
    async fn test_failed_advance_leaves_state_unchanged() {
        let backend = MockBackend::new()
            .with_response("OK".to_string())
            .with_failure_on_call(2);
        let mut session = session_with(backend);

        session.advance("hello").await.unwrap();
        let before = session.state().clone();

        let err = session.advance("again").await.unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
        assert_eq!(session.state(), &before);
    }

    #[tokio::test]
    async fn test_empty_backend_output_is_backend_error() {
        let mut session = session_with(MockBackend::new().with_response("   ".to_string()));

        let err = session.advance("hello").await.unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
        assert!(session.state().is_empty());
    }

    #[tokio::test]
    async fn test_transcript_session_extracts_generated_suffix() {
        let backend = MockBackend::new().echoing_context_with("Hi there");
        let mut session =
            DialogueSession::new(Box::new(TranscriptEncoder::new()), Box::new(backend));

        assert_eq!(session.advance("hello").await.unwrap(), "Hi there");
        assert_eq!(session.advance("bye").await.unwrap(), "Hi there");
        assert_eq!(session.state().len(), 4);
    }

    #[tokio::test]
    async fn test_transcript_session_keeps_reply_starting_with_user_text() {
        let backend = MockBackend::new().with_response("OK".to_string());
        let mut session =
            DialogueSession::new(Box::new(TranscriptEncoder::new()), Box::new(backend));

        assert_eq!(session.advance("O").await.unwrap(), "OK");
        assert_eq!(session.advance("Mock").await.unwrap(), "OK");
        assert_eq!(session.state().turns()[1].text(), "OK");
    }

    #[tokio::test]
    async fn test_phase_transitions_with_turn_limit() {
        let mut session =
            session_with(MockBackend::new().with_response("OK".to_string())).with_turn_limit(2);

        assert_eq!(session.phase(), SessionPhase::Idle);
        session.advance("one").await.unwrap();
        assert_eq!(session.phase(), SessionPhase::InProgress);
        session.advance("two").await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Done);

        let err = session.advance("three").await.unwrap_err();
        assert!(matches!(err, Error::SessionFinished(2)));
        assert_eq!(session.state().len(), 4);
    }

    #[tokio::test]
    async fn test_unbounded_session_never_reaches_done() {
        let mut session = session_with(MockBackend::new().with_response("OK".to_string()));
        for _ in 0..3 {
            session.advance("again").await.unwrap();
        }
        assert_eq!(session.phase(), SessionPhase::InProgress);
    }

    #[tokio::test]
    async fn test_window_limits_encoded_context_not_history() {
        let backend = MockBackend::new().with_response("OK".to_string());
        let observer = backend.clone();
        let mut session = session_with(backend).with_window(HistoryWindow::LastExchanges(1));

        session.advance("first").await.unwrap();
        session.advance("second").await.unwrap();
        session.advance("third").await.unwrap();

        assert_eq!(session.state().len(), 6);
        let EncodedContext::Messages(messages) = observer.last_context().unwrap() else {
            panic!("expected messages context");
        };
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["second", "OK", "third"]);
    }
}
