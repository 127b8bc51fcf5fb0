use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::error::{HelixTutorError, Result};
use crate::ports::{ImageCaptioner, TextGenerator};

const MAX_RETRIES: u32 = 3;

const CAPTION_PROMPT: &str = "Describe this image in one or two sentences for a study index. \
Say whether it is a diagram, code, a chart or a screenshot.";

/// Client for a local Ollama server's `/api/generate` endpoint.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

enum Failure {
    Retryable(HelixTutorError),
    Fatal(HelixTutorError),
}

impl OllamaClient {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        Self::with_model(config, &config.model)
    }

    /// Same server and settings, different model (e.g. a vision model for captions).
    pub fn with_model(config: &GenerationConfig, model: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        tracing::debug!("Ollama client: {} at {}", model, base_url);

        Ok(Self {
            client,
            base_url,
            model: model.to_string(),
            temperature: config.temperature,
        })
    }

    async fn complete(&self, prompt: &str, images: Vec<String>) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
            images,
        };

        let mut last_error = None;
        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_secs(2u64.pow(attempt));
                tracing::info!(
                    "Retrying Ollama request in {:?} (attempt {})",
                    delay,
                    attempt + 1
                );
                tokio::time::sleep(delay).await;
            }

            match self.send(&request).await {
                Ok(text) => return Ok(text),
                Err(Failure::Retryable(e)) => {
                    tracing::warn!("Retryable error on attempt {}: {}", attempt + 1, e);
                    last_error = Some(e);
                }
                Err(Failure::Fatal(e)) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            HelixTutorError::Generation(format!("request failed after {MAX_RETRIES} attempts"))
        }))
    }

    async fn send(&self, request: &GenerateRequest<'_>) -> std::result::Result<String, Failure> {
        let url = format!("{}/api/generate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let err = HelixTutorError::Generation(format!(
                    "could not reach Ollama at {}: {e}",
                    self.base_url
                ));
                if e.is_connect() || e.is_timeout() {
                    Failure::Retryable(err)
                } else {
                    Failure::Fatal(err)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or(body);
            let err = HelixTutorError::Generation(format!("Ollama returned {status}: {message}"));
            return Err(
                if status.as_u16() == 429 || status.is_server_error() {
                    Failure::Retryable(err)
                } else {
                    Failure::Fatal(err)
                },
            );
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            Failure::Fatal(HelixTutorError::Generation(format!("malformed response: {e}")))
        })?;

        let text = parsed.response.trim().to_string();
        if text.is_empty() {
            return Err(Failure::Fatal(HelixTutorError::Generation(
                "empty response".to_string(),
            )));
        }
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.complete(prompt, Vec::new()).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ImageCaptioner for OllamaClient {
    async fn caption(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        self.complete(CAPTION_PROMPT, vec![BASE64.encode(bytes)])
            .await
    }
}
