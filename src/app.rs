//! Application orchestration: image variations, then an ebook, then a chat.

use crate::ai::{
    ChatService, ImageVariationService, MockChatClient, MockImageVariationClient,
    OpenAiChatClient, OpenAiImageClient, TextGenerationBackend,
};
use crate::dialogue::{
    ConsoleOutput, DialogueSession, Encoder, InferenceBackend, InputSource, MessagesEncoder,
    MockBackend, OutputSink, RunReport, SessionRunner, StdinInput, TranscriptEncoder,
};
use crate::ebook::{ebook_file_name, EbookGenerator};
use crate::models::{Config, DialogueProvider};
use crate::photo::PhotoGenerator;
use crate::{prompts, Error, Result};
use chrono::Local;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio_retry::{strategy::FixedInterval, Retry};
use tracing::{error, info, warn};

const RETRY_DELAY: Duration = Duration::from_millis(2000);
const MAX_STAGE_ATTEMPTS: usize = 3;

/// Per-run knobs for the three stages.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub image_variations: u32,
    pub image_size: String,
    pub ebook_topic: Option<String>,
    pub chat_turns: usize,
}

impl From<&Config> for RunSettings {
    fn from(config: &Config) -> Self {
        Self {
            image_variations: config.image_variations,
            image_size: config.image_size.clone(),
            ebook_topic: config.ebook_topic.clone(),
            chat_turns: config.chat_turns,
        }
    }
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub photo: PhotoGenerator,
    pub ebook: EbookGenerator,
    pub session: DialogueSession,
    pub input: Box<dyn InputSource>,
    pub output: Box<dyn OutputSink>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub variations: Vec<String>,
    pub ebook_path: PathBuf,
    pub chat: RunReport,
}

/// Runs the photo, ebook and chat stages in order.
pub struct App {
    photo: PhotoGenerator,
    ebook: EbookGenerator,
    session: DialogueSession,
    input: Box<dyn InputSource>,
    output: Box<dyn OutputSink>,
    output_dir: PathBuf,
    settings: RunSettings,
    retry_delay: Duration,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(
        services: AppServices,
        output_dir: PathBuf,
        settings: RunSettings,
    ) -> Self {
        Self {
            photo: services.photo,
            ebook: services.ebook,
            session: services.session,
            input: services.input,
            output: services.output,
            output_dir,
            settings,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Construct an app wired to real providers (or mocks under `DRY_RUN`).
    pub fn new(config: &Config) -> Result<Self> {
        // Reuse one HTTP connection pool across provider clients.
        let http_client = reqwest::Client::new();

        let (images, chat): (Box<dyn ImageVariationService>, Box<dyn ChatService>) =
            if config.dry_run {
                info!("DRY_RUN enabled, using mock image and chat services");
                (
                    Box::new(MockImageVariationClient::new()) as Box<dyn ImageVariationService>,
                    Box::new(MockChatClient::new()) as Box<dyn ChatService>,
                )
            } else {
                let api_key = config
                    .openai_api_key
                    .clone()
                    .ok_or_else(|| Error::Config("OPENAI_API_KEY not set".to_string()))?;

                let mut image_client = OpenAiImageClient::new_with_client(
                    api_key.clone(),
                    config.image_model.clone(),
                    http_client.clone(),
                );
                let mut chat_client = OpenAiChatClient::new_with_client(
                    api_key,
                    config.chat_model.clone(),
                    http_client.clone(),
                );
                if let Some(base_url) = &config.openai_base_url {
                    image_client = image_client.with_base_url(base_url.clone());
                    chat_client = chat_client.with_base_url(base_url.clone());
                }
                info!(
                    "Image model: {}, ebook model: {}",
                    config.image_model, config.chat_model
                );
                (
                    Box::new(image_client) as Box<dyn ImageVariationService>,
                    Box::new(chat_client) as Box<dyn ChatService>,
                )
            };

        let (encoder, backend, speaker) = Self::build_dialogue(config, http_client)?;
        let session = DialogueSession::new(encoder, backend)
            .with_window(config.history_window())
            .with_turn_limit(config.chat_turns);

        Ok(Self::with_services(
            AppServices {
                photo: PhotoGenerator::new(images, &config.source_image, &config.output_dir),
                ebook: EbookGenerator::new(chat),
                session,
                input: Box::new(StdinInput::new()),
                output: Box::new(ConsoleOutput::new(speaker)),
            },
            config.output_dir.clone(),
            RunSettings::from(config),
        ))
    }

    fn build_dialogue(
        config: &Config,
        http_client: reqwest::Client,
    ) -> Result<(Box<dyn Encoder>, Box<dyn InferenceBackend>, &'static str)> {
        if config.dry_run {
            return Ok((
                Box::new(TranscriptEncoder::new()) as Box<dyn Encoder>,
                Box::new(MockBackend::new()) as Box<dyn InferenceBackend>,
                "MockBot",
            ));
        }

        match config.dialogue_provider {
            DialogueProvider::HuggingFace => {
                info!(
                    "Dialogue provider: Hugging Face (model: {})",
                    config.dialogue_model
                );
                let backend = TextGenerationBackend::new_with_client(
                    config.hf_api_token.clone(),
                    config.dialogue_model.clone(),
                    http_client,
                )
                .with_max_length(config.dialogue_max_length);
                Ok((
                    Box::new(TranscriptEncoder::new()) as Box<dyn Encoder>,
                    Box::new(backend) as Box<dyn InferenceBackend>,
                    "DialoGPT",
                ))
            }
            DialogueProvider::OpenAi => {
                info!("Dialogue provider: OpenAI (model: {})", config.dialogue_model);
                let api_key = config
                    .openai_api_key
                    .clone()
                    .ok_or_else(|| Error::Config("OPENAI_API_KEY not set".to_string()))?;
                let mut client = OpenAiChatClient::new_with_client(
                    api_key,
                    config.dialogue_model.clone(),
                    http_client,
                );
                if let Some(base_url) = &config.openai_base_url {
                    client = client.with_base_url(base_url.clone());
                }
                let encoder =
                    MessagesEncoder::new().with_system_prompt(prompts::DIALOGUE_SYSTEM.trim());
                Ok((
                    Box::new(encoder) as Box<dyn Encoder>,
                    Box::new(client) as Box<dyn InferenceBackend>,
                    "Assistant",
                ))
            }
        }
    }

    pub fn session(&self) -> &DialogueSession {
        &self.session
    }

    pub async fn run(&mut self) -> Result<RunSummary> {
        let variations = self
            .run_photo_generation(self.settings.image_variations, &self.settings.image_size)
            .await?;
        let ebook_path = self.run_ebook_generation().await?;
        let chat = self.run_chat_interaction(self.settings.chat_turns).await;

        if let Some(e) = &chat.error {
            warn!("Chat ended early: {}", e);
        }

        Ok(RunSummary {
            variations,
            ebook_path,
            chat,
        })
    }

    pub async fn run_photo_generation(&self, n: u32, size: &str) -> Result<Vec<String>> {
        let photo = &self.photo;
        let variations = self
            .with_retry("photo", move || photo.generate_variations(n, size))
            .await?;

        println!("Generated variations:");
        for location in &variations {
            println!("{}", location);
        }
        Ok(variations)
    }

    pub async fn run_ebook_generation(&self) -> Result<PathBuf> {
        let history = EbookGenerator::history_for(self.settings.ebook_topic.as_deref());
        let history = history.as_slice();
        let ebook = &self.ebook;
        let text = self
            .with_retry("ebook", move || ebook.generate_ebook(history))
            .await?;

        // Timestamped name avoids overwriting previous ebooks.
        let file_name = ebook_file_name(&Local::now());
        let path = self.output_dir.join(&file_name);
        self.ebook.save_ebook(&text, &path)?;

        info!("Saved ebook at: {}", path.display());
        println!("Ebook '{}' generated and saved successfully.", file_name);
        Ok(path)
    }

    /// Chat turns are never retried; a failed turn ends the conversation.
    pub async fn run_chat_interaction(&mut self, turns: usize) -> RunReport {
        info!("Starting chat for {} turn(s)", turns);
        SessionRunner::run(
            &mut self.session,
            turns,
            self.input.as_mut(),
            self.output.as_mut(),
        )
        .await
    }

    async fn with_retry<T, F, Fut>(&self, stage: &str, action: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let strategy = FixedInterval::new(self.retry_delay).take(MAX_STAGE_ATTEMPTS - 1);
        let action = &action;

        Retry::spawn(strategy, move || async move {
            info!("[{}] Running stage...", stage);
            action().await.map_err(|e| {
                warn!("[{}] Attempt failed: {}. Will retry...", stage, e);
                e
            })
        })
        .await
        .map_err(|e| {
            error!("[{}] Failed after retries: {}", stage, e);
            e
        })
    }
}
