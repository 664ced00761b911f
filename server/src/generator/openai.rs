//! OpenAI-compatible image generation client
//!
//! Calls `POST {base_url}/images/generations` and reads `data[].b64_json`.

use super::{ImageGenerator, RawImage};
use crate::config::GeneratorSettings;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Generation can take tens of seconds
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Serialize, Debug)]
struct GenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u32,
}

#[derive(Deserialize, Debug)]
struct GenerationResponse {
    #[serde(default)]
    data: Vec<GenerationDatum>,
}

#[derive(Deserialize, Debug)]
struct GenerationDatum {
    b64_json: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    message: String,
}

/// Image client for the OpenAI images API
pub struct OpenAiImageClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    size: String,
}

impl OpenAiImageClient {
    pub fn new(settings: &GeneratorSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("logosmith/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            size: settings.size.clone(),
        })
    }
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_images(&self, prompt: &str, count: u32) -> Result<Vec<RawImage>> {
        if self.api_key.is_empty() {
            return Err(AppError::Generator("Missing generator API key".to_string()));
        }

        let url = format!("{}/images/generations", self.base_url);
        tracing::info!("Requesting {} image(s) from {} ({})", count, url, self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&GenerationRequest {
                model: &self.model,
                prompt,
                size: &self.size,
                n: count,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            tracing::warn!("Generator returned status {}: {}", status, message);
            return Err(AppError::Generator(format!("{}: {}", status, message)));
        }

        let body: GenerationResponse = response.json().await?;
        let images: Vec<RawImage> = collect_images(body);

        tracing::info!("Generator returned {} image(s)", images.len());
        Ok(images)
    }
}

fn collect_images(body: GenerationResponse) -> Vec<RawImage> {
    body.data
        .into_iter()
        .filter_map(|d| d.b64_json)
        .filter(|b64| !b64.is_empty())
        .map(|b64| RawImage { b64 })
        .collect()
}
