//! LanceDB-backed vector store
//!
//! Records live in a single `laqs` table. Embeddings are normalised before
//! they are written and before they are queried, so LanceDB's L2 distance is
//! the squared L2 between unit vectors.

pub mod connection;
pub mod records;
pub mod search;

use anyhow::{anyhow, Result};
use arrow::record_batch::RecordBatchIterator;
use async_trait::async_trait;
use lancedb::{Connection, Table};
use std::path::Path;

use crate::record::{Candidate, StoredRecord};
use crate::services::vector_store::VectorStore;
use crate::similarity::{normalize, DistanceMetric};
use connection::create_connection;
use records::records_to_arrow_batch;
use search::search_nearest;

const TABLE_NAME: &str = "laqs";

pub struct LanceDbVectorStore {
  connection: Connection,
}

impl LanceDbVectorStore {
  pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
    let connection = create_connection(data_dir.as_ref()).await?;
    tracing::info!("Opened LanceDB store at {}", data_dir.as_ref().display());
    Ok(Self { connection })
  }

  async fn table_exists(&self) -> Result<bool> {
    let tables = self
      .connection
      .table_names()
      .execute()
      .await
      .map_err(|e| anyhow!("Failed to list tables: {}", e))?;
    Ok(tables.iter().any(|name| name == TABLE_NAME))
  }

  /// The table, or `None` before the first upsert
  async fn table(&self) -> Result<Option<Table>> {
    if !self.table_exists().await? {
      return Ok(None);
    }
    let table = self
      .connection
      .open_table(TABLE_NAME)
      .execute()
      .await
      .map_err(|e| anyhow!("Failed to open table '{}': {}", TABLE_NAME, e))?;
    Ok(Some(table))
  }
}

#[async_trait]
impl VectorStore for LanceDbVectorStore {
  fn kind(&self) -> &'static str {
    "lancedb"
  }

  fn metric(&self) -> DistanceMetric {
    DistanceMetric::SquaredL2
  }

  async fn upsert(&self, incoming: &[StoredRecord]) -> Result<()> {
    if incoming.is_empty() {
      return Ok(());
    }

    let normalized: Vec<StoredRecord> = incoming
      .iter()
      .map(|item| StoredRecord { record: item.record.clone(), embedding: normalize(&item.embedding) })
      .collect();
    let batch = records_to_arrow_batch(&normalized)?;
    let schema = batch.schema();
    let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);

    match self.table().await? {
      Some(table) => {
        // Matching ids are replaced in a single commit
        let mut merge = table.merge_insert(&["id"]);
        merge.when_matched_update_all(None).when_not_matched_insert_all();
        merge
          .execute(Box::new(batches))
          .await
          .map_err(|e| anyhow!("Failed to store records: {}", e))?;
      }
      None => {
        self
          .connection
          .create_table(TABLE_NAME, batches)
          .execute()
          .await
          .map_err(|e| anyhow!("Failed to create table '{}': {}", TABLE_NAME, e))?;
        tracing::info!("Created table '{}'", TABLE_NAME);
      }
    }

    tracing::debug!("Stored {} records in LanceDB", normalized.len());
    Ok(())
  }

  async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<Candidate>> {
    match self.table().await? {
      Some(table) => search_nearest(&table, &normalize(embedding), k).await,
      None => Ok(Vec::new()),
    }
  }

  async fn clear(&self) -> Result<()> {
    if let Some(table) = self.table().await? {
      table.delete("id IS NOT NULL").await.map_err(|e| anyhow!("Failed to clear table: {}", e))?;
      tracing::info!("Cleared all records from LanceDB table");
    }
    Ok(())
  }

  async fn count(&self) -> Result<usize> {
    match self.table().await? {
      Some(table) => Ok(table.count_rows(None).await?),
      None => Ok(0),
    }
  }
}
