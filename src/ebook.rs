//! Ebook generation
//!
//! A single chat completion over a seeded history, saved as plain text under
//! a timestamped file name.

use crate::ai::{ChatMessage, ChatService};
use crate::{prompts, Error, Result};
use chrono::{DateTime, TimeZone};
use std::fs;
use std::path::Path;
use tracing::info;

/// Few-shot conversation sent when no topic is configured.
const WORLD_SERIES_HISTORY: [(&str, &str); 4] = [
    ("system", "You are a helpful assistant."),
    ("user", "Who won the world series in 2020?"),
    ("assistant", "The Los Angeles Dodgers won the World Series in 2020."),
    ("user", "Where was it played?"),
];

pub struct EbookGenerator {
    chat: Box<dyn ChatService>,
}

impl EbookGenerator {
    pub fn new(chat: Box<dyn ChatService>) -> Self {
        Self { chat }
    }

    pub fn default_history() -> Vec<ChatMessage> {
        WORLD_SERIES_HISTORY
            .iter()
            .map(|(role, content)| ChatMessage::new(role, *content))
            .collect()
    }

    /// Seed for an optional topic, falling back to [`Self::default_history`].
    pub fn history_for(topic: Option<&str>) -> Vec<ChatMessage> {
        match topic {
            Some(topic) => Self::seed_history(topic),
            None => Self::default_history(),
        }
    }

    /// System prompt plus the rendered ebook request for `topic`.
    pub fn seed_history(topic: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::new("system", prompts::EBOOK_SYSTEM.trim()),
            ChatMessage::new(
                "user",
                prompts::render(prompts::EBOOK_USER.trim(), &[("topic", topic)]),
            ),
        ]
    }

    pub async fn generate_ebook(&self, history: &[ChatMessage]) -> Result<String> {
        let text = self.chat.complete(history).await?;
        if text.trim().is_empty() {
            return Err(Error::AiProvider("Ebook completion was empty".to_string()));
        }
        info!("Generated ebook text ({} chars)", text.len());
        Ok(text)
    }

    pub fn save_ebook(&self, text: &str, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)?;
        Ok(())
    }
}

/// `ebook_YYYYmmddHHMMSS.txt`, so runs never overwrite previous ebooks.
pub fn ebook_file_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("ebook_{}.txt", now.format("%Y%m%d%H%M%S"))
}
