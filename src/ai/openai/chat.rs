use super::client::OpenAiHttpClient;
use super::types::{ChatCompletionRequest, ChatMessage};
use crate::ai::ChatService;
use crate::dialogue::{EncodedContext, InferenceBackend};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// OpenAI chat completions, used both for one-shot completions and as a
/// dialogue backend over message contexts.
pub struct OpenAiChatClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, Duration::from_secs(60), client),
            model,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl ChatService for OpenAiChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        tracing::debug!(
            "Requesting chat completion ({} messages, model {})",
            messages.len(),
            self.model
        );

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
        };

        let response = self.http.chat_completion(&request).await?;

        response
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| Error::AiProvider("No response from OpenAI chat API".to_string()))
    }
}

#[async_trait]
impl InferenceBackend for OpenAiChatClient {
    async fn generate(&self, context: &EncodedContext) -> Result<String> {
        let EncodedContext::Messages(messages) = context else {
            return Err(Error::Backend(
                "OpenAI chat backend requires a message context".to_string(),
            ));
        };

        let messages: Vec<ChatMessage> = messages
            .iter()
            .map(|message| ChatMessage::new(&message.role, message.content.clone()))
            .collect();

        self.complete(&messages).await
    }
}
