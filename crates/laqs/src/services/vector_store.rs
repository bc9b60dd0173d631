//! Vector store abstraction
//!
//! Implementations persist `(embedding, record)` pairs and answer
//! nearest-neighbour queries. Each store declares the distance metric it
//! reports so scores are converted with the right formula.

use anyhow::Result;
use async_trait::async_trait;

use crate::record::{Candidate, StoredRecord};
use crate::similarity::DistanceMetric;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorStore: Send + Sync {
  /// Short backend name for diagnostics
  fn kind(&self) -> &'static str;

  /// Metric of the distances returned by `query`
  fn metric(&self) -> DistanceMetric;

  /// Insert records, replacing any with the same id
  async fn upsert(&self, records: &[StoredRecord]) -> Result<()>;

  /// The `k` nearest records ordered by ascending distance
  async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<Candidate>>;

  /// Remove every record
  async fn clear(&self) -> Result<()>;

  /// Number of stored records
  async fn count(&self) -> Result<usize>;
}
