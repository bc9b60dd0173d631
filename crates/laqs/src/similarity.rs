//! Distance to similarity conversion
//!
//! Vector stores report a distance, not a similarity. For unit-normalised
//! vectors the squared Euclidean distance is `2 * (1 - cos)`: 0 for identical
//! vectors, 2 for orthogonal ones (similarity 0). Reading that value as if it
//! were `1 - cos` doubles the apparent gap between two vectors, so every
//! conversion goes through the metric the store actually reports.

use serde::{Deserialize, Serialize};

/// Distance metric reported by a vector store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
  /// Squared L2 over normalised vectors, `2 * (1 - cos)`
  SquaredL2,
  /// Cosine distance, `1 - cos`
  Cosine,
}

impl DistanceMetric {
  /// Convert a raw distance into a similarity percentage in `[0, 100]`
  pub fn to_similarity(self, distance: f32) -> f32 {
    match self {
      DistanceMetric::SquaredL2 => corrected_similarity(distance),
      DistanceMetric::Cosine => clamp_percent((1.0 - distance) * 100.0),
    }
  }
}

/// `clamp(0, 100, (1 - distance / 2) * 100)`
pub fn corrected_similarity(distance: f32) -> f32 {
  clamp_percent((1.0 - distance / 2.0) * 100.0)
}

/// Clamp a score to `[0, 100]`; NaN collapses to 0
pub fn clamp_percent(score: f32) -> f32 {
  if score.is_nan() {
    return 0.0;
  }
  score.clamp(0.0, 100.0)
}

/// Calculate cosine similarity between two embeddings
#[cfg(test)]
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
  if a.len() != b.len() {
    return 0.0;
  }

  let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
  let magnitude_a = magnitude(a);
  let magnitude_b = magnitude(b);

  if magnitude_a == 0.0 || magnitude_b == 0.0 {
    0.0
  } else {
    dot_product / (magnitude_a * magnitude_b)
  }
}

/// Scale a vector to unit length (zero vectors are returned unchanged)
pub fn normalize(vector: &[f32]) -> Vec<f32> {
  let norm = magnitude(vector);
  if norm == 0.0 {
    return vector.to_vec();
  }
  vector.iter().map(|x| x / norm).collect()
}

/// Squared Euclidean distance between two vectors of equal length
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
  a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn magnitude(vector: &[f32]) -> f32 {
  vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}
