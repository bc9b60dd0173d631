//! In-process vector store with an optional JSON snapshot on disk
//!
//! Vectors are normalised on the way in, and distances are squared L2
//! between unit vectors, i.e. `2 * (1 - cos)`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::record::{Candidate, StoredRecord};
use crate::services::vector_store::VectorStore;
use crate::similarity::{normalize, squared_l2, DistanceMetric};

pub struct MemoryVectorStore {
  records: RwLock<Vec<StoredRecord>>,
  snapshot_path: Option<PathBuf>,
}

impl MemoryVectorStore {
  /// Store that lives only as long as the process
  pub fn new() -> Self {
    Self { records: RwLock::new(Vec::new()), snapshot_path: None }
  }

  /// Store backed by a snapshot file, loading it if it already exists
  pub fn open(snapshot_path: impl Into<PathBuf>) -> Result<Self> {
    let snapshot_path = snapshot_path.into();
    let records = load_snapshot(&snapshot_path)?;
    tracing::info!("Loaded {} records from {}", records.len(), snapshot_path.display());
    Ok(Self { records: RwLock::new(records), snapshot_path: Some(snapshot_path) })
  }

  fn persist(&self, records: &[StoredRecord]) -> Result<()> {
    match &self.snapshot_path {
      Some(path) => write_snapshot(path, records),
      None => Ok(()),
    }
  }
}

impl Default for MemoryVectorStore {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
  fn kind(&self) -> &'static str {
    "memory"
  }

  fn metric(&self) -> DistanceMetric {
    DistanceMetric::SquaredL2
  }

  async fn upsert(&self, incoming: &[StoredRecord]) -> Result<()> {
    let mut records = self.records.write().await;
    let mut dimension = records.first().map(|r| r.embedding.len());

    for item in incoming {
      let expected = *dimension.get_or_insert(item.embedding.len());
      if item.embedding.len() != expected {
        return Err(anyhow!(
          "Embedding dimension mismatch for '{}': expected {}, got {}",
          item.record.id,
          expected,
          item.embedding.len()
        ));
      }
    }

    // Memory only changes once the snapshot is written
    let mut updated = records.clone();
    for item in incoming {
      let normalized =
        StoredRecord { record: item.record.clone(), embedding: normalize(&item.embedding) };
      match updated.iter_mut().find(|existing| existing.record.id == item.record.id) {
        Some(existing) => *existing = normalized,
        None => updated.push(normalized),
      }
    }

    self.persist(&updated)?;
    *records = updated;
    Ok(())
  }

  async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<Candidate>> {
    let records = self.records.read().await;
    if let Some(first) = records.first() {
      if first.embedding.len() != embedding.len() {
        return Err(anyhow!(
          "Query dimension {} does not match stored dimension {}",
          embedding.len(),
          first.embedding.len()
        ));
      }
    }

    let query = normalize(embedding);
    let mut candidates: Vec<Candidate> = records
      .iter()
      .map(|stored| Candidate {
        record: stored.record.clone(),
        distance: squared_l2(&query, &stored.embedding),
      })
      .collect();

    candidates.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
    candidates.truncate(k);
    Ok(candidates)
  }

  async fn clear(&self) -> Result<()> {
    let mut records = self.records.write().await;
    self.persist(&[])?;
    records.clear();
    Ok(())
  }

  async fn count(&self) -> Result<usize> {
    Ok(self.records.read().await.len())
  }
}

fn load_snapshot(path: &Path) -> Result<Vec<StoredRecord>> {
  if !path.exists() {
    return Ok(Vec::new());
  }
  let content = std::fs::read_to_string(path)
    .map_err(|e| anyhow!("Failed to read snapshot {}: {}", path.display(), e))?;
  if content.trim().is_empty() {
    return Ok(Vec::new());
  }
  serde_json::from_str(&content)
    .map_err(|e| anyhow!("Corrupt snapshot {}: {}", path.display(), e))
}

fn write_snapshot(path: &Path, records: &[StoredRecord]) -> Result<()> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }

  // Replace the snapshot atomically
  let tmp_path = path.with_extension("json.tmp");
  std::fs::write(&tmp_path, serde_json::to_vec(records)?)?;
  std::fs::rename(&tmp_path, path)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::Record;
  use tempfile::TempDir;

  fn stored(id: &str, embedding: Vec<f32>) -> StoredRecord {
    StoredRecord {
      record: Record {
        id: id.to_string(),
        laq_number: String::new(),
        laq_type: String::new(),
        minister: String::new(),
        date: String::new(),
        question: format!("question {id}"),
        answer: format!("answer {id}"),
        attachments: vec![],
      },
      embedding,
    }
  }

  #[tokio::test]
  async fn test_query_orders_by_distance() {
    let store = MemoryVectorStore::new();
    store
      .upsert(&[
        stored("east", vec![1.0, 0.0]),
        stored("north", vec![0.0, 1.0]),
        stored("west", vec![-1.0, 0.0]),
      ])
      .await
      .unwrap();

    let hits = store.query(&[2.0, 0.1], 3).await.unwrap();
    let ids: Vec<_> = hits.iter().map(|c| c.record.id.as_str()).collect();
    assert_eq!(ids, vec!["east", "north", "west"]);
    assert!(hits[0].distance < 0.01);
    // opposite unit vectors sit at the far end of [0, 4]
    assert!((hits[2].distance - 4.0).abs() < 0.02);
  }

  #[tokio::test]
  async fn test_query_limits_to_k() {
    let store = MemoryVectorStore::new();
    store.upsert(&[stored("a", vec![1.0, 0.0]), stored("b", vec![0.0, 1.0])]).await.unwrap();
    assert_eq!(store.query(&[1.0, 0.0], 1).await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn test_upsert_replaces_same_id() {
    let store = MemoryVectorStore::new();
    store.upsert(&[stored("a", vec![1.0, 0.0])]).await.unwrap();
    store.upsert(&[stored("a", vec![0.0, 1.0])]).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
    let hits = store.query(&[0.0, 1.0], 1).await.unwrap();
    assert!(hits[0].distance < 1e-6);
  }

  #[tokio::test]
  async fn test_dimension_mismatch_is_rejected() {
    let store = MemoryVectorStore::new();
    store.upsert(&[stored("a", vec![1.0, 0.0])]).await.unwrap();

    assert!(store.upsert(&[stored("b", vec![1.0, 0.0, 0.0])]).await.is_err());
    assert!(store.query(&[1.0], 1).await.is_err());
    assert_eq!(store.count().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_snapshot_survives_reopen_and_clear() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store").join("records.json");

    let store = MemoryVectorStore::open(&path).unwrap();
    store.upsert(&[stored("a", vec![3.0, 4.0])]).await.unwrap();
    drop(store);

    let reopened = MemoryVectorStore::open(&path).unwrap();
    assert_eq!(reopened.count().await.unwrap(), 1);

    reopened.clear().await.unwrap();
    let cleared = MemoryVectorStore::open(&path).unwrap();
    assert_eq!(cleared.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_failed_snapshot_write_leaves_records_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("store").join("records.json");
    let store = MemoryVectorStore::open(&path).unwrap();
    store.upsert(&[stored("a", vec![1.0, 0.0])]).await.unwrap();

    // A regular file where the snapshot directory should be
    let blocked = temp_dir.path().join("blocked");
    std::fs::write(&blocked, "not a directory").unwrap();
    let broken = MemoryVectorStore {
      records: RwLock::new(store.records.read().await.clone()),
      snapshot_path: Some(blocked.join("records.json")),
    };

    assert!(broken.upsert(&[stored("b", vec![0.0, 1.0])]).await.is_err());
    assert_eq!(broken.count().await.unwrap(), 1);
    let hits = broken.query(&[0.0, 1.0], 5).await.unwrap();
    assert!(hits.iter().all(|c| c.record.id != "b"));

    assert!(broken.clear().await.is_err());
    assert_eq!(broken.count().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_empty_store_returns_no_candidates() {
    let store = MemoryVectorStore::new();
    assert!(store.query(&[1.0, 0.0], 5).await.unwrap().is_empty());
  }
}
