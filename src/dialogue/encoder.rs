//! Conversation encoders.
//!
//! An [`Encoder`] turns committed history into the backend-specific
//! [`EncodedContext`] and pulls the newly generated reply back out of the raw
//! backend output. Encoding is a pure function of the turns it is given.

use super::turn::{Role, Turn};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// End-of-sequence token used by GPT-2 family conversational models.
pub const DEFAULT_EOS_TOKEN: &str = "<|endoftext|>";

/// Role-tagged message in a chat-style context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextMessage {
    pub role: String,
    pub content: String,
}

/// Backend-specific serialized form of a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedContext {
    /// Turns concatenated, each terminated by an end-of-sequence token.
    Transcript(String),
    /// One message per turn, optionally preceded by a system message.
    Messages(Vec<ContextMessage>),
}

pub trait Encoder: Send + Sync {
    fn encode(&self, turns: &[Turn]) -> EncodedContext;

    fn decode(&self, context: &EncodedContext) -> Result<Vec<Turn>>;

    /// Extract the reply generated beyond `context` from `raw` output.
    fn extract_reply(&self, context: &EncodedContext, raw: &str) -> Result<String>;
}

fn non_empty_reply(reply: &str) -> Result<String> {
    let reply = reply.trim();
    if reply.is_empty() {
        return Err(Error::Backend("Backend returned an empty reply".to_string()));
    }
    Ok(reply.to_string())
}

/// DialoGPT-style encoder: `turn<eos>turn<eos>...`.
pub struct TranscriptEncoder {
    eos_token: String,
}

impl TranscriptEncoder {
    pub fn new() -> Self {
        Self::with_eos_token(DEFAULT_EOS_TOKEN)
    }

    pub fn with_eos_token(eos_token: impl Into<String>) -> Self {
        Self {
            eos_token: eos_token.into(),
        }
    }
}

impl Default for TranscriptEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for TranscriptEncoder {
    fn encode(&self, turns: &[Turn]) -> EncodedContext {
        let mut transcript = String::new();
        for turn in turns {
            transcript.push_str(turn.text());
            transcript.push_str(&self.eos_token);
        }
        EncodedContext::Transcript(transcript)
    }

    fn decode(&self, context: &EncodedContext) -> Result<Vec<Turn>> {
        let EncodedContext::Transcript(transcript) = context else {
            return Err(Error::Backend(
                "Transcript encoder cannot decode a message context".to_string(),
            ));
        };

        if transcript.is_empty() {
            return Ok(Vec::new());
        }
        if !transcript.ends_with(&self.eos_token) {
            return Err(Error::Backend(
                "Transcript is not terminated by the end-of-sequence token".to_string(),
            ));
        }

        // Turns alternate starting with the user, so position gives the role.
        Ok(transcript
            .split_terminator(self.eos_token.as_str())
            .enumerate()
            .map(|(i, text)| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                Turn::new(role, text)
            })
            .collect())
    }

    fn extract_reply(&self, context: &EncodedContext, raw: &str) -> Result<String> {
        let EncodedContext::Transcript(transcript) = context else {
            return Err(Error::Backend(
                "Transcript encoder received a message context".to_string(),
            ));
        };

        // Only an exact, eos-terminated echo of the prompt is removed; anything
        // else is already the generated suffix.
        let generated = raw.strip_prefix(transcript.as_str()).unwrap_or(raw);

        let reply = generated
            .split(self.eos_token.as_str())
            .find(|piece| !piece.trim().is_empty())
            .unwrap_or("");
        non_empty_reply(reply)
    }
}

/// Chat-completions encoder: one role-tagged message per turn.
#[derive(Default)]
pub struct MessagesEncoder {
    system_prompt: Option<String>,
}

impl MessagesEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

impl Encoder for MessagesEncoder {
    fn encode(&self, turns: &[Turn]) -> EncodedContext {
        let system = self.system_prompt.iter().map(|prompt| ContextMessage {
            role: "system".to_string(),
            content: prompt.clone(),
        });
        let history = turns.iter().map(|turn| ContextMessage {
            role: turn.role().as_str().to_string(),
            content: turn.text().to_string(),
        });
        EncodedContext::Messages(system.chain(history).collect())
    }

    fn decode(&self, context: &EncodedContext) -> Result<Vec<Turn>> {
        let EncodedContext::Messages(messages) = context else {
            return Err(Error::Backend(
                "Messages encoder cannot decode a transcript context".to_string(),
            ));
        };

        messages
            .iter()
            .filter(|message| message.role != "system")
            .map(|message| match message.role.as_str() {
                "user" => Ok(Turn::user(message.content.clone())),
                "assistant" => Ok(Turn::assistant(message.content.clone())),
                other => Err(Error::Backend(format!("Unknown message role '{}'", other))),
            })
            .collect()
    }

    fn extract_reply(&self, context: &EncodedContext, raw: &str) -> Result<String> {
        if !matches!(context, EncodedContext::Messages(_)) {
            return Err(Error::Backend(
                "Messages encoder received a transcript context".to_string(),
            ));
        }
        // Chat endpoints only return the new message.
        non_empty_reply(raw)
    }
}
