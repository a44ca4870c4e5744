//! OpenAI-compatible generation backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use keyplan_core::{defaults, Error, GenerationBackend, Result};

use super::types::*;

/// Map a failed chat completion onto a keyplan error. Key and model problems
/// are configuration errors; the rest are inference errors.
fn endpoint_error(status: u16, error_type: &str, message: &str) -> Error {
    match (status, error_type) {
        (401 | 403, _) => Error::Config(format!("Endpoint rejected the API key: {}", message)),
        (404, _) | (_, "model_not_found") => {
            Error::Config(format!("Model unavailable: {}", message))
        }
        _ => Error::Inference(format!("Endpoint returned {}: {}", status, message)),
    }
}

/// Configuration for the OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key. Without one, generation is disabled.
    pub api_key: Option<String>,
    /// Model to use for generation.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::OPENAI_URL.to_string(),
            api_key: None,
            model: defaults::GEN_MODEL.to_string(),
            timeout_seconds: defaults::GEN_TIMEOUT_SECS,
        }
    }
}

impl OpenAIConfig {
    /// Load from `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_MODEL` and
    /// `OPENAI_TIMEOUT`. A blank key counts as missing.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| defaults::OPENAI_URL.to_string()),
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| defaults::GEN_MODEL.to_string()),
            timeout_seconds: std::env::var("OPENAI_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::GEN_TIMEOUT_SECS),
        }
    }

    /// gpt-5 family models reject a custom temperature.
    pub fn supports_temperature(&self) -> bool {
        !self.model.starts_with("gpt-5")
    }
}

/// OpenAI-compatible generation backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            base_url = %config.base_url,
            model = %config.model,
            enabled = config.api_key.is_some(),
            "Initializing OpenAI backend"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Whether an API key is configured.
    pub fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn build_request(&self, endpoint: &str, api_key: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        self.client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
    }
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    #[instrument(
        skip(self, system, prompt),
        fields(subsystem = "inference", component = "openai", op = "generate", model = %self.config.model)
    )]
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            debug!("No API key configured, skipping generation");
            return Ok(String::new());
        };

        let start = Instant::now();
        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self
                .config
                .supports_temperature()
                .then_some(defaults::GEN_TEMPERATURE),
        };

        let response = self
            .build_request("/chat/completions", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            let (error_type, message) = match serde_json::from_str::<OpenAIErrorResponse>(&text) {
                Ok(body) => (body.error.error_type, body.error.message),
                Err(_) => (String::new(), text),
            };
            warn!(
                status_code = status,
                retryable = status == 429 || status >= 500,
                "Generation request failed"
            );
            return Err(endpoint_error(status, &error_type, &message));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Inference(format!("Failed to read response: {}", e)))?;
        let result: ChatCompletionResponse = serde_json::from_str(&body)?;
        let content = result.into_content();

        debug!(
            prompt_len = prompt.len(),
            response_len = content.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation complete"
        );
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
