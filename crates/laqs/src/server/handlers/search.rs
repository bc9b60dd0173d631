//! Semantic search handler

use axum::{
  extract::{Extension, Json, State},
  response::Json as ResponseJson,
};

use crate::rag::SearchOptions;
use crate::rerank::QualityStats;
use crate::server::handlers::{error_response, log_failure, resolve_top_k, ApiResult};
use crate::server::middleware::RequestContext;
use crate::server::types::{BaseResponse, SearchRequest, SearchResponse, SearchResultData};
use crate::server::AppState;

/// POST /api/search - Ranked LAQs for a free-text query
pub async fn search(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Json(request): Json<SearchRequest>,
) -> ApiResult<SearchResponse> {
  context
    .log_info(
      &format!(
        "Searching LAQs: query={:?}, top_k={:?}, rerank={}",
        request.query, request.top_k, request.use_reranking
      ),
      "search-api",
    )
    .await;

  let top_k = resolve_top_k(request.top_k, state.rag.settings().search_top_k);
  let options = top_k.map(|top_k| SearchOptions {
    top_k,
    use_reranking: request.use_reranking,
    use_query_formatting: request.use_query_formatting,
    min_similarity: request.min_similarity,
  });

  let outcome = match options {
    Ok(options) => state.rag.search(&request.query, &options).await,
    Err(e) => Err(e),
  };

  match outcome {
    Ok(results) => {
      context.log_success(&format!("Search returned {} results", results.len()), "search-api").await;

      let quality = QualityStats::from_results(&results);
      let results: Vec<SearchResultData> = results.into_iter().map(SearchResultData::from).collect();
      let response = SearchResponse { query: request.query, count: results.len(), results, quality };
      Ok(ResponseJson(BaseResponse::success(response, context.request_id)))
    }
    Err(e) => {
      log_failure(&context, &e, "search-api").await;
      Err(error_response(&e, context.request_id))
    }
  }
}
