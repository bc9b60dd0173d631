//! Hybrid re-ranking of nearest-neighbour candidates
//!
//! The vector store returns more candidates than requested; this stage
//! rescores them with keyword overlap and a freshness signal, then keeps the
//! best `top_k`. Both the corrected ("original") similarity and the boosted
//! one are kept on each result.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::record::{Candidate, MatchQuality, Record, ScoredResult};
use crate::similarity::{clamp_percent, DistanceMetric};

/// Weight of question-text overlap in the keyword boost
const QUESTION_WEIGHT: f32 = 0.7;
/// Weight of answer-text overlap in the keyword boost
const ANSWER_WEIGHT: f32 = 0.3;
/// Boost for a query whose every token appears in both question and answer
const MAX_KEYWORD_BOOST: f32 = 10.0;
/// Flat boost for records dated on or after the recency cutoff
const FRESHNESS_BOOST: f32 = 2.0;

const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%Y-%m-%d", "%d/%m/%Y", "%d.%m.%Y"];

/// Parameters shared by both ranking paths
#[derive(Debug, Clone, Copy)]
pub struct RankParams {
  pub top_k: usize,
  pub recency_cutoff_year: i32,
  pub metric: DistanceMetric,
}

/// Rescore candidates with keyword and freshness boosts and keep the top `k`.
///
/// Ordering is by boosted similarity, then by original similarity, then by the
/// order the store returned the candidates in.
pub fn rerank(query: &str, candidates: Vec<Candidate>, params: &RankParams) -> Vec<ScoredResult> {
  let query_tokens = tokenize(query);

  let mut results: Vec<ScoredResult> = candidates
    .into_iter()
    .map(|candidate| {
      let original = params.metric.to_similarity(candidate.distance);
      let boost = keyword_boost(&query_tokens, &candidate.record)
        + freshness_boost(&candidate.record, params.recency_cutoff_year);
      let similarity = clamp_percent(original + boost);
      ScoredResult {
        match_quality: MatchQuality::from_similarity(similarity),
        record: candidate.record,
        original_similarity: original,
        similarity,
      }
    })
    .collect();

  results.sort_by(compare_ranked);
  results.truncate(params.top_k);
  results
}

/// Score candidates by corrected similarity alone, keeping the store's order
pub fn rank_by_similarity(candidates: Vec<Candidate>, params: &RankParams) -> Vec<ScoredResult> {
  candidates
    .into_iter()
    .take(params.top_k)
    .map(|candidate| {
      let similarity = params.metric.to_similarity(candidate.distance);
      ScoredResult {
        match_quality: MatchQuality::from_similarity(similarity),
        record: candidate.record,
        original_similarity: similarity,
        similarity,
      }
    })
    .collect()
}

fn compare_ranked(a: &ScoredResult, b: &ScoredResult) -> Ordering {
  b.similarity
    .partial_cmp(&a.similarity)
    .unwrap_or(Ordering::Equal)
    .then_with(|| b.original_similarity.partial_cmp(&a.original_similarity).unwrap_or(Ordering::Equal))
}

/// Keyword boost in `[0, MAX_KEYWORD_BOOST]`
pub fn keyword_boost(query_tokens: &HashSet<String>, record: &Record) -> f32 {
  if query_tokens.is_empty() {
    return 0.0;
  }

  let question_overlap = overlap_fraction(query_tokens, &tokenize(&record.question));
  let answer_overlap = overlap_fraction(query_tokens, &tokenize(&record.answer));

  (question_overlap * QUESTION_WEIGHT + answer_overlap * ANSWER_WEIGHT) * MAX_KEYWORD_BOOST
}

/// Freshness boost for records from the cutoff year onward
pub fn freshness_boost(record: &Record, cutoff_year: i32) -> f32 {
  match record_year(&record.date) {
    Some(year) if year >= cutoff_year => FRESHNESS_BOOST,
    _ => 0.0,
  }
}

fn overlap_fraction(query_tokens: &HashSet<String>, text_tokens: &HashSet<String>) -> f32 {
  let shared = query_tokens.intersection(text_tokens).count();
  shared as f32 / query_tokens.len().max(1) as f32
}

/// Lowercased alphanumeric tokens of a text, deduplicated
pub fn tokenize(text: &str) -> HashSet<String> {
  text
    .split(|c: char| !c.is_alphanumeric())
    .filter(|token| !token.is_empty())
    .map(str::to_lowercase)
    .collect()
}

/// Year a record was tabled, if its date can be read
pub fn record_year(date: &str) -> Option<i32> {
  let date = date.trim();
  if date.is_empty() {
    return None;
  }

  DATE_FORMATS
    .iter()
    .find_map(|format| NaiveDate::parse_from_str(date, format).ok())
    .map(|parsed| parsed.year())
    .or_else(|| {
      date
        .split(|c: char| !c.is_ascii_digit())
        .filter(|segment| segment.len() == 4)
        .last()
        .and_then(|segment| segment.parse().ok())
    })
}

/// Distribution of match quality across a result list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QualityStats {
  pub excellent: usize,
  pub good: usize,
  pub fair: usize,
}

impl QualityStats {
  pub fn from_results(results: &[ScoredResult]) -> Self {
    results.iter().fold(Self::default(), |mut stats, result| {
      match result.match_quality {
        MatchQuality::Excellent => stats.excellent += 1,
        MatchQuality::Good => stats.good += 1,
        MatchQuality::Fair => stats.fair += 1,
      }
      stats
    })
  }
}
