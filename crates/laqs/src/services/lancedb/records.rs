//! Arrow RecordBatch conversion for LAQ records

use anyhow::{anyhow, Result};
use arrow::array::{Array, FixedSizeListBuilder, Float32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

use crate::record::StoredRecord;

/// String columns, in schema order
const TEXT_COLUMNS: [&str; 8] =
  ["id", "laq_number", "laq_type", "minister", "date", "question", "answer", "attachments"];

/// Arrow schema for a table whose embeddings have `dimension` entries
pub fn laq_schema(dimension: usize) -> Arc<Schema> {
  let mut fields: Vec<Field> =
    TEXT_COLUMNS.iter().map(|name| Field::new(*name, DataType::Utf8, false)).collect();
  fields.push(Field::new(
    "embedding",
    DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dimension as i32),
    false,
  ));
  Arc::new(Schema::new(fields))
}

/// Convert stored records into a single RecordBatch
pub fn records_to_arrow_batch(records: &[StoredRecord]) -> Result<RecordBatch> {
  let dimension = records
    .first()
    .map(|r| r.embedding.len())
    .ok_or_else(|| anyhow!("Cannot create RecordBatch from empty records"))?;

  let attachments = records
    .iter()
    .map(|r| serde_json::to_string(&r.record.attachments))
    .collect::<Result<Vec<_>, _>>()?;

  let mut columns: Vec<Arc<dyn Array>> = vec![
    string_column(records, |r| &r.record.id),
    string_column(records, |r| &r.record.laq_number),
    string_column(records, |r| &r.record.laq_type),
    string_column(records, |r| &r.record.minister),
    string_column(records, |r| &r.record.date),
    string_column(records, |r| &r.record.question),
    string_column(records, |r| &r.record.answer),
    Arc::new(StringArray::from(attachments)),
  ];

  let mut embeddings =
    FixedSizeListBuilder::new(Float32Array::builder(dimension * records.len()), dimension as i32);
  for stored in records {
    if stored.embedding.len() != dimension {
      return Err(anyhow!(
        "Embedding dimension mismatch for '{}': expected {}, got {}",
        stored.record.id,
        dimension,
        stored.embedding.len()
      ));
    }
    embeddings.values().append_slice(&stored.embedding);
    embeddings.append(true);
  }
  columns.push(Arc::new(embeddings.finish()));

  RecordBatch::try_new(laq_schema(dimension), columns)
    .map_err(|e| anyhow!("Failed to create RecordBatch: {}", e))
}

fn string_column<F>(records: &[StoredRecord], field: F) -> Arc<dyn Array>
where
  F: Fn(&StoredRecord) -> &str,
{
  Arc::new(StringArray::from(records.iter().map(|r| field(r)).collect::<Vec<&str>>()))
}
