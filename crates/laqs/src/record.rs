//! LAQ records and the transient search types built from them

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One Legislative Assembly Question and its answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Record {
  /// Unique identifier; generated at ingestion when left empty
  #[serde(default)]
  pub id: String,

  /// LAQ number as printed on the paper
  #[serde(default)]
  pub laq_number: String,

  /// Question type tag, e.g. "starred" or "unstarred"
  #[serde(default, rename = "type")]
  pub laq_type: String,

  /// Minister who answered
  #[serde(default)]
  pub minister: String,

  /// Date the question was tabled, as printed (e.g. "15-03-2024")
  #[serde(default)]
  pub date: String,

  pub question: String,

  pub answer: String,

  /// Annexures referenced by the answer
  #[serde(default)]
  pub attachments: Vec<String>,
}

impl Record {
  /// Text fed to the embedding model at ingestion time.
  ///
  /// A short metadata line precedes the same `Question:`/`Answer:` layout
  /// that queries are formatted into.
  pub fn embedding_text(&self) -> String {
    let mut context = Vec::new();
    if !self.laq_number.is_empty() {
      context.push(format!("LAQ {}", self.laq_number));
    }
    if !self.laq_type.is_empty() {
      context.push(format!("({})", self.laq_type));
    }
    if !self.minister.is_empty() {
      context.push(format!("Minister: {}", self.minister));
    }
    if !self.date.is_empty() {
      context.push(format!("Date: {}", self.date));
    }

    let body = format!("Question: {}\nAnswer: {}", self.question, self.answer);
    if context.is_empty() {
      body
    } else {
      format!("{}\n{}", context.join(" "), body)
    }
  }
}

/// A record together with its embedding, as persisted in a vector store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
  pub record: Record,
  pub embedding: Vec<f32>,
}

/// A nearest-neighbour hit: record plus the store's raw distance
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
  pub record: Record,
  pub distance: f32,
}

/// Categorical label for how well a result matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchQuality {
  Excellent,
  Good,
  Fair,
}

impl MatchQuality {
  pub const EXCELLENT_THRESHOLD: f32 = 90.0;
  pub const GOOD_THRESHOLD: f32 = 75.0;

  pub fn from_similarity(similarity: f32) -> Self {
    if similarity >= Self::EXCELLENT_THRESHOLD {
      MatchQuality::Excellent
    } else if similarity >= Self::GOOD_THRESHOLD {
      MatchQuality::Good
    } else {
      MatchQuality::Fair
    }
  }
}

/// A ranked search result, alive only for one search or chat call
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult {
  pub record: Record,
  /// Corrected similarity straight from the vector distance
  pub original_similarity: f32,
  /// Similarity after keyword and freshness boosts
  pub similarity: f32,
  pub match_quality: MatchQuality,
}
