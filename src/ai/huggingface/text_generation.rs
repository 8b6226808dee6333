//! Causal-LM dialogue backend over the Hugging Face text-generation task.
//!
//! The model receives the whole transcript and only the newly generated text
//! is requested back (`return_full_text: false`).

use super::client::HuggingFaceHttpClient;
use crate::dialogue::{EncodedContext, InferenceBackend};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on prompt + generated tokens, as DialoGPT examples use.
pub const DEFAULT_MAX_LENGTH: u32 = 1000;

#[derive(Debug, Serialize)]
struct TextGenerationRequest<'a> {
    inputs: &'a str,
    parameters: TextGenerationParameters,
    options: TextGenerationOptions,
}

#[derive(Debug, Serialize)]
struct TextGenerationParameters {
    max_length: u32,
    return_full_text: bool,
}

#[derive(Debug, Serialize)]
struct TextGenerationOptions {
    wait_for_model: bool,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextGenerationResponse {
    Batch(Vec<GeneratedText>),
    Single(GeneratedText),
}

pub struct TextGenerationBackend {
    http: HuggingFaceHttpClient,
    max_length: u32,
}

impl TextGenerationBackend {
    pub fn new(api_token: Option<String>, model: String) -> Self {
        Self::new_with_client(api_token, model, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_token: Option<String>,
        model: String,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: HuggingFaceHttpClient::new_with_client(
                api_token,
                model,
                Duration::from_secs(120),
                client,
            ),
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = max_length;
        self
    }
}

#[async_trait]
impl InferenceBackend for TextGenerationBackend {
    async fn generate(&self, context: &EncodedContext) -> Result<String> {
        let EncodedContext::Transcript(transcript) = context else {
            return Err(Error::Backend(
                "Text generation backend requires a transcript context".to_string(),
            ));
        };

        tracing::debug!(
            "Generating with {} ({} char transcript)",
            self.http.model(),
            transcript.len()
        );

        let request = TextGenerationRequest {
            inputs: transcript,
            parameters: TextGenerationParameters {
                max_length: self.max_length,
                return_full_text: false,
            },
            options: TextGenerationOptions {
                wait_for_model: true,
            },
        };

        let response: TextGenerationResponse = self.http.infer(&request).await?;
        let generated = match response {
            TextGenerationResponse::Batch(items) => items.into_iter().next(),
            TextGenerationResponse::Single(item) => Some(item),
        };

        generated
            .map(|item| item.generated_text)
            .ok_or_else(|| Error::AiProvider("No generated text in response".to_string()))
    }
}
