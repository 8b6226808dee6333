//! Configuration models
//!
//! Runtime settings loaded from the environment (and `.env`), with defaults
//! matching the stock demo run: one 1024x1024 variation, one ebook, five chat
//! turns with DialoGPT.

use crate::ai::huggingface::text_generation::DEFAULT_MAX_LENGTH;
use crate::dialogue::HistoryWindow;
use crate::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueProvider {
    /// Causal LM over the Hugging Face inference API.
    HuggingFace,
    /// OpenAI chat completions.
    OpenAi,
}

impl FromStr for DialogueProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "openai" => Ok(Self::OpenAi),
            other => Err(Error::Config(format!(
                "Unknown DIALOGUE_PROVIDER '{}'. Expected 'huggingface' or 'openai'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub hf_api_token: Option<String>,
    pub chat_model: String,
    pub image_model: String,
    pub dialogue_provider: DialogueProvider,
    pub dialogue_model: String,
    pub dialogue_max_length: u32,
    pub source_image: PathBuf,
    pub output_dir: PathBuf,
    pub image_size: String,
    pub image_variations: u32,
    pub chat_turns: usize,
    pub history_window: Option<usize>,
    /// When unset the ebook request uses the built-in World Series
    /// conversation.
    pub ebook_topic: Option<String>,
    pub dry_run: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let dry_run = get("DRY_RUN")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let dialogue_provider = get("DIALOGUE_PROVIDER")
            .map(|v| v.parse::<DialogueProvider>())
            .transpose()?
            .unwrap_or(DialogueProvider::HuggingFace);

        let config = Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            hf_api_token: get("HF_API_TOKEN"),
            chat_model: get_or("CHAT_MODEL", "gpt-3.5-turbo"),
            image_model: get_or("IMAGE_MODEL", "dall-e-2"),
            dialogue_provider,
            dialogue_model: get_or("DIALOGUE_MODEL", "microsoft/DialoGPT-medium"),
            dialogue_max_length: parse_number(
                get("DIALOGUE_MAX_LENGTH"),
                "DIALOGUE_MAX_LENGTH",
                DEFAULT_MAX_LENGTH,
            )?,
            source_image: PathBuf::from(get_or("SOURCE_IMAGE", "image_path.jpg")),
            output_dir: PathBuf::from(get_or("OUTPUT_DIR", "output_folder")),
            image_size: get_or("IMAGE_SIZE", "1024x1024"),
            image_variations: parse_number(get("IMAGE_VARIATIONS"), "IMAGE_VARIATIONS", 1)?,
            chat_turns: parse_number(get("CHAT_TURNS"), "CHAT_TURNS", 5)?,
            history_window: get("HISTORY_WINDOW")
                .map(|v| parse_history_window(&v))
                .transpose()?,
            ebook_topic: get("EBOOK_TOPIC"),
            dry_run,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !self.dry_run && self.openai_api_key.is_none() {
            return Err(Error::Config(
                "OPENAI_API_KEY not set (set DRY_RUN=true to run with mock services)".to_string(),
            ));
        }
        Ok(())
    }

    pub fn history_window(&self) -> HistoryWindow {
        self.history_window
            .map(HistoryWindow::LastExchanges)
            .unwrap_or(HistoryWindow::Unbounded)
    }
}

/// Parse a history window size, shared by `HISTORY_WINDOW` and the CLI.
/// Zero is rejected.
pub fn parse_history_window(raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::Config(format!(
            "HISTORY_WINDOW must be a positive integer, got '{}'",
            raw
        ))),
    }
}

fn parse_number<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            Error::Config(format!(
                "{} must be a non-negative integer, got '{}'",
                key, raw
            ))
        }),
    }
}
