use super::client::{OpenAiHttpClient, IMAGE_VARIATIONS_PATH};
use super::types::ImageResponse;
use crate::ai::{GeneratedImage, ImageVariationService};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::time::Duration;

pub struct OpenAiImageClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiImageClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, Duration::from_secs(120), client),
            model,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl ImageVariationService for OpenAiImageClient {
    async fn create_variations(
        &self,
        png_bytes: &[u8],
        n: u32,
        size: &str,
    ) -> Result<Vec<GeneratedImage>> {
        tracing::debug!(
            "Requesting {} variation(s) at {} ({} byte source)",
            n,
            size,
            png_bytes.len()
        );

        let image_part = Part::bytes(png_bytes.to_vec())
            .file_name("image.png")
            .mime_str("image/png")?;
        let form = Form::new()
            .part("image", image_part)
            .text("model", self.model.clone())
            .text("n", n.to_string())
            .text("size", size.to_string());

        let response: ImageResponse = self.http.post_multipart(IMAGE_VARIATIONS_PATH, form).await?;

        if response.data.is_empty() {
            return Err(Error::AiProvider(
                "No image data in OpenAI response".to_string(),
            ));
        }

        response
            .data
            .into_iter()
            .map(|item| {
                if let Some(url) = item.url {
                    Ok(GeneratedImage::Url(url))
                } else if let Some(b64_json) = item.b64_json {
                    use base64::Engine as _;
                    base64::engine::general_purpose::STANDARD
                        .decode(b64_json)
                        .map(GeneratedImage::Bytes)
                        .map_err(|e| {
                            Error::AiProvider(format!("Failed to decode base64 image: {}", e))
                        })
                } else {
                    Err(Error::AiProvider(
                        "No image data (neither base64 nor URL) in response".to_string(),
                    ))
                }
            })
            .collect()
    }
}
