//! Embedding generation through a local Ollama server

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Turns text into a fixed-length vector
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
  async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest<'a> {
  model: &'a str,
  prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
  embedding: Vec<f32>,
}

/// Embedding client backed by Ollama's `/api/embeddings` endpoint
pub struct OllamaEmbeddingClient {
  client: Client,
  base_url: String,
  model: String,
}

impl OllamaEmbeddingClient {
  pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
    Self { client: Client::new(), base_url: trim_base_url(base_url.into()), model: model.into() }
  }

  pub fn model(&self) -> &str {
    &self.model
  }
}

#[async_trait]
impl EmbeddingClient for OllamaEmbeddingClient {
  async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    if text.trim().is_empty() {
      return Err(anyhow!("Cannot embed empty text"));
    }

    let request = OllamaEmbeddingRequest { model: &self.model, prompt: text };

    let response = self
      .client
      .post(format!("{}/api/embeddings", self.base_url))
      .json(&request)
      .send()
      .await
      .map_err(|e| anyhow!("Embedding request failed: {}", e))?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(anyhow!("Embedding service returned {}: {}", status, body.trim()));
    }

    let parsed: OllamaEmbeddingResponse =
      response.json().await.map_err(|e| anyhow!("Invalid embedding response: {}", e))?;

    if parsed.embedding.is_empty() {
      return Err(anyhow!("Embedding service returned an empty vector for model '{}'", self.model));
    }

    Ok(parsed.embedding)
  }
}

pub(crate) fn trim_base_url(url: String) -> String {
  url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_base_url_trailing_slash_is_trimmed() {
    let client = OllamaEmbeddingClient::new("http://localhost:11434/", "nomic-embed-text");
    assert_eq!(client.base_url, "http://localhost:11434");
    assert_eq!(client.model(), "nomic-embed-text");
  }

  #[tokio::test]
  async fn test_empty_text_is_rejected_without_request() {
    // Port 9 (discard) is never an Ollama server; the guard must fire first
    let client = OllamaEmbeddingClient::new("http://127.0.0.1:9", "nomic-embed-text");
    let err = client.embed("   ").await.unwrap_err();
    assert!(err.to_string().contains("empty text"));
  }
}
