//! Generative text model abstraction and implementations.
//!
//! Defines the [`TextModel`] trait and concrete implementations:
//! - **[`DisabledModel`]**: returns errors; used when no extractor is configured.
//! - **[`OpenAIModel`]**: calls the OpenAI chat completions API.
//! - **[`OllamaModel`]**: calls a local Ollama instance's `/api/generate` endpoint.
//!
//! Use [`create_model`] to instantiate the appropriate model from the
//! `[extractor]` configuration:
//!
//! ```rust
//! # use shotlist::config::ExtractorConfig;
//! # use shotlist::llm::create_model;
//! let config = ExtractorConfig::default(); // provider = "disabled"
//! let model = create_model(&config).unwrap();
//! assert_eq!(model.model_name(), "disabled");
//! ```
//!
//! A single prompt/response call is made per extraction; failures are not
//! retried.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::ExtractorConfig;
use crate::error::{Error, Result};

/// A single-shot prompt → text completion backend.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;

    /// Sends `prompt` and returns the model's raw text response.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Build the model selected by `config.provider`.
pub fn create_model(config: &ExtractorConfig) -> Result<Box<dyn TextModel>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledModel)),
        "openai" => Ok(Box::new(OpenAIModel::new(config)?)),
        "ollama" => Ok(Box::new(OllamaModel::new(config)?)),
        other => Err(Error::Config(format!(
            "Unknown extractor provider: {}",
            other
        ))),
    }
}

// ============ Disabled Model ============

/// A no-op model that always fails.
///
/// Used when `extractor.provider = "disabled"`.
pub struct DisabledModel;

#[async_trait]
impl TextModel for DisabledModel {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(Error::Config(
            "Extractor provider is disabled; set [extractor].provider in the config".into(),
        ))
    }
}

// ============ OpenAI Model ============

/// Text model using the OpenAI chat completions API.
///
/// Requires the `OPENAI_API_KEY` environment variable to be set.
pub struct OpenAIModel {
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAIModel {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| Error::Config("extractor.model required for OpenAI provider".into()))?;

        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::Auth("OPENAI_API_KEY environment variable not set".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl TextModel for OpenAIModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Extraction(format!("OpenAI request failed: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 401 {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Error::Auth(format!("OpenAI rejected the API key: {}", body_text)));
        }
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Error::Extraction(format!(
                "OpenAI API error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response.json().await?;
        parse_openai_response(&json)
    }
}

/// Extracts `choices[0].message.content` from a chat completion.
fn parse_openai_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| Error::Extraction("Invalid OpenAI response: missing message content".into()))
}

// ============ Ollama Model ============

/// Text model using a local Ollama instance.
///
/// Calls `POST /api/generate` on the configured URL (default:
/// `http://localhost:11434`) with streaming disabled.
pub struct OllamaModel {
    model: String,
    url: String,
    client: reqwest::Client,
}

impl OllamaModel {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| Error::Config("extractor.model required for Ollama provider".into()))?;
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { model, url, client })
    }
}

#[async_trait]
impl TextModel for OllamaModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.url.trim_end_matches('/')))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                Error::Extraction(format!(
                    "Ollama connection error (is Ollama running at {}?): {}",
                    self.url, e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Error::Extraction(format!(
                "Ollama API error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response.json().await?;
        json.get("response")
            .and_then(|r| r.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Extraction("Invalid Ollama response: missing response".into()))
    }
}
