//! Error kinds surfaced by search, chat and ingestion
//!
//! `InvalidInput` is the caller's fault and maps to a 4xx response. The other
//! two variants are upstream failures (embedding service, vector store or LLM)
//! and map to a 5xx response carrying the upstream cause verbatim.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
  #[error("{0}")]
  InvalidInput(String),

  #[error("Retrieval failed: {0}")]
  Retrieval(String),

  #[error("Generation failed: {0}")]
  Generation(String),
}

pub type Result<T> = std::result::Result<T, RagError>;

impl RagError {
  pub fn invalid(message: impl Into<String>) -> Self {
    Self::InvalidInput(message.into())
  }

  /// Wrap an embedding service or vector store failure
  pub fn retrieval(err: impl std::fmt::Display) -> Self {
    Self::Retrieval(err.to_string())
  }

  /// Wrap an LLM failure
  pub fn generation(err: impl std::fmt::Display) -> Self {
    Self::Generation(err.to_string())
  }

  /// True when the request itself was at fault
  pub fn is_client_error(&self) -> bool {
    matches!(self, Self::InvalidInput(_))
  }

  /// Stable key reported in API error payloads
  pub fn key(&self) -> &'static str {
    match self {
      Self::InvalidInput(_) => "invalid_input",
      Self::Retrieval(_) => "retrieval_failed",
      Self::Generation(_) => "generation_failed",
    }
  }
}
