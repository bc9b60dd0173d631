//! REST API types with schemars annotations for schema generation

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{MatchQuality, Record, ScoredResult};
use crate::rerank::QualityStats;
use crate::similarity::DistanceMetric;

// Base Response Structure
// ======================

/// Base response object for all API endpoints
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BaseResponse<T> {
  /// API versioning information
  pub versioning: VersionInfo,

  /// Transaction ID for logging correlation
  pub transaction_id: Uuid,

  /// Optional error information
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub errors: Vec<ApiError>,

  /// Response data (generic for different endpoint types)
  #[serde(flatten)]
  pub data: T,
}

/// API versioning information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionInfo {
  pub latest: String,
  pub requested: String,
  pub resolved: String,
}

/// API error information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
  /// Error key, unique to the error source
  pub key: String,

  /// Human readable error message
  pub message: String,
}

// Status Endpoints
// ================

/// Response for the root endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RootResponse {
  pub service: String,
  pub version: String,
  pub health: String,
  pub api: String,
}

/// Models and upstream the server was started with
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ServiceInfo {
  pub ollama_url: String,
  pub llm_model: String,
  pub embedding_model: String,
}

/// Response for /health
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
  /// "healthy" when the store answers, "degraded" otherwise
  pub status: String,
  pub version: String,
  pub store: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub record_count: Option<usize>,
  pub models: ServiceInfo,
}

/// Response for /api
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiInfoResponse {
  pub latest: String,
  pub versions: ApiVersions,
  /// JSON schemas of the request bodies, keyed by route
  pub schemas: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiVersions {
  pub latest: String,
  pub active: Vec<String>,
}

// Logs Endpoint
// =============

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LogsQuery {
  /// Most recent entries to return (default 100)
  pub limit: Option<usize>,

  /// Level filter; "all" matches everything
  pub level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LogsResponse {
  pub logs: Vec<LogEntry>,
}

pub type LogEntry = crate::server::request_log::LogEntry;

// Search and Chat
// ===============

fn default_true() -> bool {
  true
}

/// Request for /api/search
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchRequest {
  /// Free-text query
  pub query: String,

  /// Number of results (server default when omitted)
  #[serde(default)]
  pub top_k: Option<i64>,

  /// Apply keyword and freshness boosts
  #[serde(default = "default_true")]
  pub use_reranking: bool,

  /// Wrap the query in the question/answer template before embedding
  #[serde(default = "default_true")]
  pub use_query_formatting: bool,

  /// Drop results whose vector similarity (0-100) is below this value
  #[serde(default)]
  pub min_similarity: Option<f32>,
}

/// One ranked LAQ in a response
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchResultData {
  pub id: String,
  pub laq_number: String,
  #[serde(rename = "type")]
  pub laq_type: String,
  pub minister: String,
  pub date: String,
  pub question: String,
  pub answer: String,
  #[serde(default)]
  pub attachments: Vec<String>,
  /// Similarity after re-ranking, 0-100
  pub similarity: f32,
  /// Similarity from the vector distance alone, 0-100
  pub original_similarity: f32,
  pub match_quality: MatchQuality,
}

impl From<ScoredResult> for SearchResultData {
  fn from(result: ScoredResult) -> Self {
    let Record { id, laq_number, laq_type, minister, date, question, answer, attachments } =
      result.record;
    Self {
      id,
      laq_number,
      laq_type,
      minister,
      date,
      question,
      answer,
      attachments,
      similarity: result.similarity,
      original_similarity: result.original_similarity,
      match_quality: result.match_quality,
    }
  }
}

/// Response for /api/search
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchResponse {
  pub query: String,
  pub results: Vec<SearchResultData>,
  pub count: usize,
  pub quality: QualityStats,
}

/// Request for /api/chat
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ChatRequest {
  pub question: String,

  /// Number of LAQs used as context (server default when omitted)
  #[serde(default)]
  pub top_k: Option<i64>,
}

/// Response for /api/chat
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ChatResponse {
  pub question: String,
  pub answer: String,
  pub sources: Vec<SearchResultData>,
}

// Records and Database
// ====================

/// Request for POST /api/records
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct IngestRequest {
  pub records: Vec<Record>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct IngestResponse {
  /// Records embedded and stored by this request
  pub ingested: usize,
  /// Records in the store afterwards, absent when the count failed
  #[serde(skip_serializing_if = "Option::is_none")]
  pub total_records: Option<usize>,
}

/// Response for /api/database/info
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DatabaseInfoResponse {
  pub store: String,
  pub metric: DistanceMetric,
  pub record_count: usize,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ClearResponse {
  /// Records removed
  pub removed: usize,
}

// Helper Functions
// ================

impl<T> BaseResponse<T> {
  /// Create a successful response
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { versioning: VersionInfo::current(), transaction_id, errors: Vec::new(), data }
  }

  /// Create an error response
  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> BaseResponse<()> {
    BaseResponse { versioning: VersionInfo::current(), transaction_id, errors, data: () }
  }
}

impl VersionInfo {
  fn current() -> Self {
    let version = env!("CARGO_PKG_VERSION");
    Self { latest: version.to_string(), requested: version.to_string(), resolved: version.to_string() }
  }
}

impl ApiError {
  pub fn new(key: &str, message: &str) -> Self {
    Self { key: key.to_string(), message: message.to_string() }
  }
}
