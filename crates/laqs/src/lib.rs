//! LAQs - Legislative Assembly Question retrieval and chat
//!
//! Semantic search over a corpus of question/answer records with a hybrid
//! re-ranking stage, plus LLM answers grounded on the retrieved records.

pub mod config;
pub mod error;
pub mod query;
pub mod rag;
pub mod record;
pub mod rerank;
pub mod server;
pub mod services;
pub mod similarity;

pub use error::RagError;
pub use rag::{ChatAnswer, RagService, RetrievalSettings, SearchOptions};
pub use record::{Candidate, MatchQuality, Record, ScoredResult, StoredRecord};
