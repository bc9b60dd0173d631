//! Text generation through a local Ollama server

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::embeddings::trim_base_url;

/// Produces an answer for a fully assembled prompt
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmClient: Send + Sync {
  async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Sampling options forwarded to the model
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GenerationOptions {
  pub temperature: f32,
  pub top_p: f32,
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
  model: &'a str,
  prompt: &'a str,
  stream: bool,
  options: GenerationOptions,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
  response: String,
}

/// LLM client backed by Ollama's `/api/generate` endpoint
pub struct OllamaLlmClient {
  client: Client,
  base_url: String,
  model: String,
  options: GenerationOptions,
}

impl OllamaLlmClient {
  pub fn new(base_url: impl Into<String>, model: impl Into<String>, options: GenerationOptions) -> Self {
    Self {
      client: Client::new(),
      base_url: trim_base_url(base_url.into()),
      model: model.into(),
      options,
    }
  }

  pub fn model(&self) -> &str {
    &self.model
  }
}

#[async_trait]
impl LlmClient for OllamaLlmClient {
  async fn generate(&self, prompt: &str) -> Result<String> {
    let request =
      OllamaGenerateRequest { model: &self.model, prompt, stream: false, options: self.options };

    let response = self
      .client
      .post(format!("{}/api/generate", self.base_url))
      .json(&request)
      .send()
      .await
      .map_err(|e| anyhow!("LLM request failed: {}", e))?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(anyhow!("LLM returned {}: {}", status, body.trim()));
    }

    let parsed: OllamaGenerateResponse =
      response.json().await.map_err(|e| anyhow!("Invalid LLM response: {}", e))?;

    Ok(parsed.response)
  }
}
