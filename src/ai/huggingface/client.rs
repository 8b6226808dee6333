use crate::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// Lightweight Hugging Face inference API client.
pub struct HuggingFaceHttpClient {
    client: Client,
    api_token: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl HuggingFaceHttpClient {
    pub fn new_with_client(
        api_token: Option<String>,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        Self {
            client,
            api_token,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Model repository ID, e.g. `microsoft/DialoGPT-medium`.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Runs inference against `/models/{model}`.
    pub async fn infer<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!("{}/models/{}", self.base_url, self.model);
        let mut builder = self.client.post(&url).timeout(self.timeout).json(request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Failed to send request to Hugging Face: {}", e);
            e
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!(
                "Hugging Face API error (status {}): {}",
                status,
                error_text
            );
            return Err(Error::AiProvider(format!(
                "Hugging Face API error (status {}): {}",
                status, error_text
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Hugging Face response: {}\nBody: {}", e, body);
            Error::AiProvider(format!("Failed to parse Hugging Face response: {}", e))
        })
    }
}
