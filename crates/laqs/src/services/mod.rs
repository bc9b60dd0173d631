//! External collaborators: embedding model, LLM and vector store
//!
//! Each one sits behind an async trait so the orchestrator can be exercised
//! with mocks and the concrete backend can be swapped at startup.

pub mod embeddings;
pub mod llm;
pub mod memory_store;
pub mod vector_store;

#[cfg(feature = "lancedb-store")]
pub mod lancedb;

pub use embeddings::{EmbeddingClient, OllamaEmbeddingClient};
pub use llm::{LlmClient, OllamaLlmClient};
pub use memory_store::MemoryVectorStore;
pub use vector_store::VectorStore;
