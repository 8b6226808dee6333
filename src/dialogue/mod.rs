//! Turn-based dialogue controller
//!
//! A [`DialogueSession`] owns the conversation history and advances it one
//! exchange at a time through an [`InferenceBackend`]; a [`SessionRunner`]
//! drives a fixed number of turns between an input source and an output sink.

pub mod console;
pub mod encoder;
pub mod mock;
pub mod runner;
pub mod session;
pub mod state;
pub mod turn;

pub use console::{ConsoleOutput, StdinInput};
pub use encoder::{ContextMessage, EncodedContext, Encoder, MessagesEncoder, TranscriptEncoder};
pub use mock::{MockBackend, RecordingSink, ScriptedInput};
pub use runner::{InputSource, OutputSink, RunReport, RunnerOutput, SessionRunner};
pub use session::{DialogueSession, SessionPhase};
pub use state::{ConversationState, HistoryWindow};
pub use turn::{Role, Turn};

use crate::Result;
use async_trait::async_trait;

/// Produces the next assistant utterance for an encoded conversation.
///
/// Implementations return the raw provider output; the session's encoder is
/// responsible for isolating the newly generated reply.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn generate(&self, context: &EncodedContext) -> Result<String>;
}
