//! Search and chat orchestration
//!
//! Sequences query formatting, embedding, nearest-neighbour lookup, score
//! correction and re-ranking, and for chat, a single grounded LLM call.
//! Every upstream call is attempted exactly once.

pub mod prompt;

use std::sync::Arc;

use crate::error::{RagError, Result};
use crate::query::prepare_query;
use crate::record::{Candidate, Record, ScoredResult, StoredRecord};
use crate::rerank::{rank_by_similarity, rerank, RankParams};
use crate::services::{EmbeddingClient, LlmClient, VectorStore};
use crate::similarity::DistanceMetric;

/// Retrieval tuning shared by every request
#[derive(Debug, Clone)]
pub struct RetrievalSettings {
  /// Results returned by search when the caller does not ask for a count
  pub search_top_k: usize,
  /// Records used to ground a chat answer by default
  pub chat_top_k: usize,
  /// Upper bound on candidates fetched for re-ranking
  pub candidate_ceiling: usize,
  /// Records dated in or after this year get the freshness boost
  pub recency_cutoff_year: i32,
  /// Chat ignores records whose corrected similarity is below this percentage
  pub relevance_threshold: f32,
}

impl Default for RetrievalSettings {
  fn default() -> Self {
    Self {
      search_top_k: 5,
      chat_top_k: 5,
      candidate_ceiling: 30,
      recency_cutoff_year: 2024,
      relevance_threshold: 40.0,
    }
  }
}

/// Per-call search switches
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
  pub top_k: usize,
  pub use_reranking: bool,
  pub use_query_formatting: bool,
  /// Drop candidates whose corrected similarity is below this percentage
  pub min_similarity: Option<f32>,
}

impl SearchOptions {
  pub fn new(top_k: usize) -> Self {
    Self { top_k, use_reranking: true, use_query_formatting: true, min_similarity: None }
  }
}

/// Generated answer and the records it was grounded on
#[derive(Debug, Clone)]
pub struct ChatAnswer {
  pub answer: String,
  pub sources: Vec<ScoredResult>,
}

pub struct RagService {
  embeddings: Arc<dyn EmbeddingClient>,
  store: Arc<dyn VectorStore>,
  llm: Arc<dyn LlmClient>,
  settings: RetrievalSettings,
}

impl RagService {
  pub fn new(
    embeddings: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmClient>,
    settings: RetrievalSettings,
  ) -> Self {
    Self { embeddings, store, llm, settings }
  }

  pub fn settings(&self) -> &RetrievalSettings {
    &self.settings
  }

  pub fn metric(&self) -> DistanceMetric {
    self.store.metric()
  }

  pub fn store_kind(&self) -> &'static str {
    self.store.kind()
  }

  /// Semantic search with optional re-ranking and query formatting
  pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<ScoredResult>> {
    let query = validate_query(query)?;
    if options.top_k == 0 {
      return Err(RagError::invalid("top_k must be greater than zero"));
    }

    let query_text = prepare_query(query, options.use_query_formatting);
    let embedding = self.embeddings.embed(&query_text).await.map_err(RagError::retrieval)?;

    let fetch_k = self.fetch_size(options);
    let candidates = self.store.query(&embedding, fetch_k).await.map_err(RagError::retrieval)?;
    let fetched = candidates.len();

    let params = RankParams {
      top_k: options.top_k,
      recency_cutoff_year: self.settings.recency_cutoff_year,
      metric: self.store.metric(),
    };
    let candidates = apply_threshold(candidates, options.min_similarity, params.metric);

    let results = if options.use_reranking {
      rerank(query, candidates, &params)
    } else {
      rank_by_similarity(candidates, &params)
    };

    tracing::debug!(
      fetched,
      returned = results.len(),
      reranked = options.use_reranking,
      "search completed"
    );
    Ok(results)
  }

  /// Answer a question from the most relevant records
  pub async fn chat(&self, question: &str, top_k: Option<usize>) -> Result<ChatAnswer> {
    let question = validate_query(question)?;
    let top_k = top_k.unwrap_or(self.settings.chat_top_k);

    let options =
      SearchOptions { min_similarity: Some(self.settings.relevance_threshold), ..SearchOptions::new(top_k) };
    let sources = self.search(question, &options).await?;
    if sources.is_empty() {
      return Ok(ChatAnswer { answer: prompt::NO_SOURCES_ANSWER.to_string(), sources });
    }

    let context = prompt::build_context(&sources);
    let chat_prompt = prompt::build_chat_prompt(&context, question);
    let answer = self.llm.generate(&chat_prompt).await.map_err(RagError::generation)?;

    Ok(ChatAnswer { answer, sources })
  }

  /// Embed and store records, one at a time; returns the number stored
  pub async fn ingest(&self, records: Vec<Record>) -> Result<usize> {
    if records.is_empty() {
      return Err(RagError::invalid("No records to ingest"));
    }

    let mut stored = Vec::with_capacity(records.len());
    for mut record in records {
      if record.question.trim().is_empty() || record.answer.trim().is_empty() {
        return Err(RagError::invalid(format!(
          "Record '{}' needs both a question and an answer",
          record.id
        )));
      }
      if record.id.trim().is_empty() {
        record.id = uuid::Uuid::new_v4().to_string();
      }

      let embedding =
        self.embeddings.embed(&record.embedding_text()).await.map_err(RagError::retrieval)?;
      stored.push(StoredRecord { record, embedding });
    }

    self.store.upsert(&stored).await.map_err(RagError::retrieval)?;
    tracing::info!("Ingested {} records", stored.len());
    Ok(stored.len())
  }

  /// Delete every stored record
  pub async fn clear(&self) -> Result<()> {
    self.store.clear().await.map_err(RagError::retrieval)
  }

  pub async fn count(&self) -> Result<usize> {
    self.store.count().await.map_err(RagError::retrieval)
  }

  /// Candidates to fetch: `top_k` without re-ranking, else `3 * top_k`
  /// capped at the ceiling but never below `top_k`
  fn fetch_size(&self, options: &SearchOptions) -> usize {
    if options.use_reranking {
      options.top_k.saturating_mul(3).min(self.settings.candidate_ceiling).max(options.top_k)
    } else {
      options.top_k
    }
  }
}

fn validate_query(query: &str) -> Result<&str> {
  let trimmed = query.trim();
  if trimmed.is_empty() {
    return Err(RagError::invalid("Query cannot be empty"));
  }
  Ok(trimmed)
}

fn apply_threshold(
  candidates: Vec<Candidate>,
  min_similarity: Option<f32>,
  metric: DistanceMetric,
) -> Vec<Candidate> {
  match min_similarity {
    Some(threshold) => candidates
      .into_iter()
      .filter(|candidate| metric.to_similarity(candidate.distance) >= threshold)
      .collect(),
    None => candidates,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::MatchQuality;
  use crate::services::embeddings::MockEmbeddingClient;
  use crate::services::llm::MockLlmClient;
  use crate::services::vector_store::MockVectorStore;
  use anyhow::anyhow;

  fn record(id: &str, question: &str, date: &str) -> Record {
    Record {
      id: id.to_string(),
      laq_number: id.trim_start_matches("laq-").to_string(),
      laq_type: "starred".to_string(),
      minister: "Minister for Finance".to_string(),
      date: date.to_string(),
      question: question.to_string(),
      answer: "Answer text.".to_string(),
      attachments: vec![],
    }
  }

  fn candidates() -> Vec<Candidate> {
    vec![
      Candidate { record: record("laq-1", "Road repairs in the district", "10-06-2022"), distance: 0.25 },
      Candidate {
        record: record("laq-2", "Budget allocation for education in 2024", "15-03-2024"),
        distance: 0.3,
      },
      Candidate { record: record("laq-3", "Stray cattle", "01-01-2020"), distance: 1.2 },
    ]
  }

  fn embedder() -> MockEmbeddingClient {
    let mut embeddings = MockEmbeddingClient::new();
    embeddings.expect_embed().returning(|_| Ok(vec![0.1, 0.2, 0.3]));
    embeddings
  }

  fn store_returning(results: Vec<Candidate>) -> MockVectorStore {
    let mut store = MockVectorStore::new();
    store.expect_metric().return_const(DistanceMetric::SquaredL2);
    store.expect_query().returning(move |_, k| Ok(results.iter().take(k).cloned().collect()));
    store
  }

  fn service(
    embeddings: MockEmbeddingClient,
    store: MockVectorStore,
    llm: MockLlmClient,
  ) -> RagService {
    RagService::new(Arc::new(embeddings), Arc::new(store), Arc::new(llm), RetrievalSettings::default())
  }

  #[tokio::test]
  async fn test_empty_query_makes_no_upstream_calls() {
    let mut embeddings = MockEmbeddingClient::new();
    embeddings.expect_embed().times(0);
    let mut store = MockVectorStore::new();
    store.expect_query().times(0);
    let mut llm = MockLlmClient::new();
    llm.expect_generate().times(0);

    let rag = service(embeddings, store, llm);

    let err = rag.search("   ", &SearchOptions::new(5)).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidInput(_)));

    let err = rag.chat("", None).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidInput(_)));
  }

  #[tokio::test]
  async fn test_zero_top_k_is_invalid_input() {
    let rag = service(MockEmbeddingClient::new(), MockVectorStore::new(), MockLlmClient::new());
    let err = rag.search("budget", &SearchOptions::new(0)).await.unwrap_err();
    assert!(err.is_client_error());
  }

  #[tokio::test]
  async fn test_store_failure_surfaces_once_without_retry() {
    let mut store = MockVectorStore::new();
    store.expect_query().times(1).returning(|_, _| Err(anyhow!("vector store unavailable")));

    let rag = service(embedder(), store, MockLlmClient::new());
    let err = rag.search("budget", &SearchOptions::new(5)).await.unwrap_err();

    assert!(matches!(err, RagError::Retrieval(_)));
    assert!(err.to_string().contains("vector store unavailable"));
  }

  #[tokio::test]
  async fn test_embedding_failure_is_retrieval_failure() {
    let mut embeddings = MockEmbeddingClient::new();
    embeddings.expect_embed().times(1).returning(|_| Err(anyhow!("ollama not running")));
    let mut store = MockVectorStore::new();
    store.expect_query().times(0);

    let rag = service(embeddings, store, MockLlmClient::new());
    let err = rag.search("budget", &SearchOptions::new(5)).await.unwrap_err();
    assert!(matches!(err, RagError::Retrieval(ref cause) if cause.contains("ollama not running")));
  }

  #[tokio::test]
  async fn test_query_is_formatted_before_embedding() {
    let mut embeddings = MockEmbeddingClient::new();
    embeddings
      .expect_embed()
      .withf(|text: &str| text == "Question: budget\nAnswer: ")
      .times(1)
      .returning(|_| Ok(vec![1.0]));

    let rag = service(embeddings, store_returning(candidates()), MockLlmClient::new());
    rag.search("  budget ", &SearchOptions::new(1)).await.unwrap();
  }

  #[tokio::test]
  async fn test_unformatted_query_is_embedded_raw() {
    let mut embeddings = MockEmbeddingClient::new();
    embeddings.expect_embed().withf(|text: &str| text == "budget").times(1).returning(|_| Ok(vec![1.0]));

    let rag = service(embeddings, store_returning(candidates()), MockLlmClient::new());
    let options = SearchOptions { use_query_formatting: false, ..SearchOptions::new(1) };
    rag.search("budget", &options).await.unwrap();
  }

  #[tokio::test]
  async fn test_fetch_size_triples_top_k_with_ceiling() {
    for (top_k, rerank, expected) in [(4, true, 12), (20, true, 30), (40, true, 40), (4, false, 4)] {
      let mut store = MockVectorStore::new();
      store.expect_metric().return_const(DistanceMetric::SquaredL2);
      store.expect_query().withf(move |_, k| *k == expected).times(1).returning(|_, _| Ok(Vec::new()));

      let rag = service(embedder(), store, MockLlmClient::new());
      let options = SearchOptions { use_reranking: rerank, ..SearchOptions::new(top_k) };
      assert!(rag.search("budget", &options).await.unwrap().is_empty());
    }
  }

  #[tokio::test]
  async fn test_reranking_reorders_and_truncates() {
    let rag = service(embedder(), store_returning(candidates()), MockLlmClient::new());
    let results =
      rag.search("budget allocation education 2024", &SearchOptions::new(2)).await.unwrap();

    let ids: Vec<_> = results.iter().map(|r| r.record.id.as_str()).collect();
    assert_eq!(ids, vec!["laq-2", "laq-1"]);
    assert!(results[0].similarity > results[0].original_similarity);
  }

  #[tokio::test]
  async fn test_disabled_reranking_keeps_scores_equal() {
    let rag = service(embedder(), store_returning(candidates()), MockLlmClient::new());
    let options = SearchOptions { use_reranking: false, ..SearchOptions::new(2) };
    let results = rag.search("budget allocation education 2024", &options).await.unwrap();

    let ids: Vec<_> = results.iter().map(|r| r.record.id.as_str()).collect();
    assert_eq!(ids, vec!["laq-1", "laq-2"]);
    for result in &results {
      assert_eq!(result.similarity, result.original_similarity);
    }
  }

  #[tokio::test]
  async fn test_min_similarity_filters_weak_candidates() {
    let rag = service(embedder(), store_returning(candidates()), MockLlmClient::new());
    let options = SearchOptions { min_similarity: Some(50.0), ..SearchOptions::new(5) };
    let results = rag.search("stray cattle", &options).await.unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.record.id != "laq-3"));
  }

  #[tokio::test]
  async fn test_chat_grounds_prompt_on_sources() {
    let mut llm = MockLlmClient::new();
    llm
      .expect_generate()
      .withf(|prompt: &str| prompt.contains("LAQ #2 (starred)") && prompt.contains("Question: education budget"))
      .times(1)
      .returning(|_| Ok("According to LAQ #2, the allocation rose.".to_string()));

    let rag = service(embedder(), store_returning(candidates()), llm);
    let answer = rag.chat("education budget", Some(2)).await.unwrap();

    assert_eq!(answer.answer, "According to LAQ #2, the allocation rose.");
    assert_eq!(answer.sources.len(), 2);
    assert_eq!(answer.sources[0].record.id, "laq-2");
  }

  #[tokio::test]
  async fn test_chat_without_sources_skips_llm() {
    let mut llm = MockLlmClient::new();
    llm.expect_generate().times(0);

    let rag = service(embedder(), store_returning(Vec::new()), llm);
    let answer = rag.chat("anything", None).await.unwrap();

    assert_eq!(answer.answer, prompt::NO_SOURCES_ANSWER);
    assert!(answer.sources.is_empty());
  }

  #[tokio::test]
  async fn test_chat_ignores_matches_below_relevance_threshold() {
    let mut llm = MockLlmClient::new();
    llm.expect_generate().times(0);

    // 25% and 30% similar, both under the 40% default
    let weak = vec![
      Candidate { record: record("laq-1", "Road repairs in the district", "2022"), distance: 1.5 },
      Candidate { record: record("laq-2", "Stray cattle", "2020"), distance: 1.4 },
    ];
    let rag = service(embedder(), store_returning(weak), llm);
    let answer = rag.chat("monsoon forecast", None).await.unwrap();

    assert_eq!(answer.answer, prompt::NO_SOURCES_ANSWER);
    assert!(answer.sources.is_empty());
  }

  #[tokio::test]
  async fn test_llm_failure_is_generation_failure() {
    let mut llm = MockLlmClient::new();
    llm.expect_generate().times(1).returning(|_| Err(anyhow!("model not loaded")));

    let rag = service(embedder(), store_returning(candidates()), llm);
    let err = rag.chat("education budget", None).await.unwrap_err();

    assert!(matches!(err, RagError::Generation(ref cause) if cause.contains("model not loaded")));
  }

  #[tokio::test]
  async fn test_ingest_embeds_each_record_and_upserts_once() {
    let mut embeddings = MockEmbeddingClient::new();
    embeddings
      .expect_embed()
      .withf(|text: &str| text.contains("Question: ") && text.contains("Minister: Minister for Finance"))
      .times(2)
      .returning(|_| Ok(vec![0.5, 0.5]));
    let mut store = MockVectorStore::new();
    store
      .expect_upsert()
      .withf(|records: &[StoredRecord]| records.len() == 2 && records.iter().all(|r| !r.record.id.is_empty()))
      .times(1)
      .returning(|_| Ok(()));

    let rag = service(embeddings, store, MockLlmClient::new());
    let unnamed = Record { id: String::new(), ..record("laq-9", "Ferry timings", "2023") };
    let count = rag.ingest(vec![record("laq-8", "Bus depots", "2024"), unnamed]).await.unwrap();
    assert_eq!(count, 2);
  }

  #[tokio::test]
  async fn test_ingest_rejects_incomplete_records() {
    let rag = service(MockEmbeddingClient::new(), MockVectorStore::new(), MockLlmClient::new());

    assert!(rag.ingest(Vec::new()).await.unwrap_err().is_client_error());

    let blank = Record { answer: " ".to_string(), ..record("laq-7", "Question", "2024") };
    assert!(rag.ingest(vec![blank]).await.unwrap_err().is_client_error());
  }

  #[tokio::test]
  async fn test_match_quality_follows_adjusted_score() {
    let rag = service(
      embedder(),
      store_returning(vec![Candidate { record: record("laq-5", "pension arrears", "2024"), distance: 0.3 }]),
      MockLlmClient::new(),
    );
    let results = rag.search("pension arrears", &SearchOptions::new(1)).await.unwrap();
    // 85 base + 7 keyword + 2 freshness
    assert!((results[0].similarity - 94.0).abs() < 1e-3);
    assert_eq!(results[0].match_quality, MatchQuality::Excellent);
  }
}
