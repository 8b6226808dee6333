//! AI provider integrations
//!
//! Provider clients for OpenAI (chat completions and image variations) and
//! Hugging Face (causal-LM text generation), plus in-memory mocks.

pub mod huggingface;
pub mod mock;
pub mod openai;

pub use huggingface::TextGenerationBackend;
pub use mock::{MockChatClient, MockImageVariationClient};
pub use openai::{ChatMessage, OpenAiChatClient, OpenAiImageClient};

use crate::Result;
use async_trait::async_trait;

/// One-shot chat completion over a full message history.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// A generated image as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    Url(String),
    Bytes(Vec<u8>),
}

#[async_trait]
pub trait ImageVariationService: Send + Sync {
    /// Request `n` variations of a PNG source image at `size` (e.g. `1024x1024`).
    async fn create_variations(
        &self,
        png_bytes: &[u8],
        n: u32,
        size: &str,
    ) -> Result<Vec<GeneratedImage>>;
}
