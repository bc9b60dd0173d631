//! Vector search and result decoding for LanceDB

use anyhow::{anyhow, Result};
use arrow::array::{Array, Float32Array, StringArray};
use arrow::record_batch::RecordBatch;
use futures::stream::StreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};

use crate::record::{Candidate, Record};

/// Nearest neighbours by L2 distance, closest first
pub async fn search_nearest(table: &Table, embedding: &[f32], limit: usize) -> Result<Vec<Candidate>> {
  let mut stream = table
    .vector_search(embedding)?
    .column("embedding")
    .distance_type(DistanceType::L2)
    .limit(limit)
    .execute()
    .await
    .map_err(|e| anyhow!("Vector search failed: {}", e))?;

  let mut candidates = Vec::new();
  while let Some(batch) = stream.next().await {
    let batch = batch.map_err(|e| anyhow!("Error reading batch: {}", e))?;
    candidates.extend(decode_batch(&batch)?);
  }
  Ok(candidates)
}

fn decode_batch(batch: &RecordBatch) -> Result<Vec<Candidate>> {
  let distances = batch
    .column_by_name("_distance")
    .and_then(|col| col.as_any().downcast_ref::<Float32Array>())
    .ok_or_else(|| anyhow!("Missing '_distance' column"))?;

  let id = string_column(batch, "id")?;
  let laq_number = string_column(batch, "laq_number")?;
  let laq_type = string_column(batch, "laq_type")?;
  let minister = string_column(batch, "minister")?;
  let date = string_column(batch, "date")?;
  let question = string_column(batch, "question")?;
  let answer = string_column(batch, "answer")?;
  let attachments = string_column(batch, "attachments")?;

  (0..batch.num_rows())
    .map(|row| -> Result<Candidate> {
      let record = Record {
        id: id.value(row).to_string(),
        laq_number: laq_number.value(row).to_string(),
        laq_type: laq_type.value(row).to_string(),
        minister: minister.value(row).to_string(),
        date: date.value(row).to_string(),
        question: question.value(row).to_string(),
        answer: answer.value(row).to_string(),
        attachments: serde_json::from_str(attachments.value(row))?,
      };
      // A null distance never ranks above a real hit
      let distance = if distances.is_null(row) { f32::INFINITY } else { distances.value(row) };
      Ok(Candidate { record, distance })
    })
    .collect()
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
  batch
    .column_by_name(name)
    .ok_or_else(|| anyhow!("Missing '{}' column", name))?
    .as_any()
    .downcast_ref::<StringArray>()
    .ok_or_else(|| anyhow!("Failed to cast '{}' column to StringArray", name))
}
