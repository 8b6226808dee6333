use super::{ChatMessage, ChatService, GeneratedImage, ImageVariationService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockChatClient {
    responses: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_response(self, response: String) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn last_request(&self) -> Option<Vec<ChatMessage>> {
        self.requests.lock().unwrap().last().cloned()
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatService for MockChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
        self.requests.lock().unwrap().push(messages.to_vec());

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Default mock response
            let last = messages
                .last()
                .and_then(|m| m.content.clone())
                .unwrap_or_default();
            Ok(format!("Mock ebook answering: {}", last))
        } else {
            let index = (*count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

#[derive(Clone)]
pub struct MockImageVariationClient {
    images: Arc<Mutex<Vec<GeneratedImage>>>,
    should_fail: Arc<Mutex<bool>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockImageVariationClient {
    pub fn new() -> Self {
        Self {
            images: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_image(self, image: GeneratedImage) -> Self {
        self.images.lock().unwrap().push(image);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockImageVariationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageVariationService for MockImageVariationClient {
    async fn create_variations(
        &self,
        _png_bytes: &[u8],
        n: u32,
        size: &str,
    ) -> Result<Vec<GeneratedImage>> {
        *self.call_count.lock().unwrap() += 1;

        if *self.should_fail.lock().unwrap() {
            return Err(Error::AiProvider("Mock image failure".to_string()));
        }

        let images = self.images.lock().unwrap();
        Ok((0..n as usize)
            .map(|i| {
                if images.is_empty() {
                    GeneratedImage::Url(format!("https://images.mock/{}/variation_{}.png", size, i))
                } else {
                    images[i % images.len()].clone()
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_chat_client_default_response() {
        let client = MockChatClient::new();
        let text = client
            .complete(&[ChatMessage::new("user", "Where was it played?")])
            .await
            .unwrap();
        assert!(text.contains("Where was it played?"));
    }

    #[tokio::test]
    async fn test_mock_chat_client_custom_responses() {
        let client = MockChatClient::new()
            .with_response("Chapter 1".to_string())
            .with_response("Chapter 2".to_string());

        assert_eq!(client.complete(&[]).await.unwrap(), "Chapter 1");
        assert_eq!(client.complete(&[]).await.unwrap(), "Chapter 2");
        // Should cycle back
        assert_eq!(client.complete(&[]).await.unwrap(), "Chapter 1");
        assert_eq!(client.get_call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_image_client_returns_n_images() {
        let client = MockImageVariationClient::new();
        let images = client.create_variations(&[], 3, "512x512").await.unwrap();
        assert_eq!(images.len(), 3);
        assert_eq!(client.get_call_count(), 1);
    }
}
