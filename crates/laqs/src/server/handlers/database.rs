//! Corpus management handlers

use axum::{
  extract::{Extension, Json, State},
  response::Json as ResponseJson,
};

use crate::server::handlers::{error_response, log_failure, ApiResult};
use crate::server::middleware::RequestContext;
use crate::server::types::{
  BaseResponse, ClearResponse, DatabaseInfoResponse, IngestRequest, IngestResponse,
};
use crate::server::AppState;

/// POST /api/records - Embed and store LAQ records
pub async fn ingest_records(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Json(request): Json<IngestRequest>,
) -> ApiResult<IngestResponse> {
  let submitted = request.records.len();
  context.log_info(&format!("Ingesting {submitted} records"), "records-api").await;

  let ingested = match state.rag.ingest(request.records).await {
    Ok(count) => count,
    Err(e) => {
      log_failure(&context, &e, "records-api").await;
      return Err(error_response(&e, context.request_id));
    }
  };

  // The records are stored at this point, so a failed count only loses the total
  let total_records = match state.rag.count().await {
    Ok(total) => {
      context.log_success(&format!("Stored {ingested} records ({total} total)"), "records-api").await;
      Some(total)
    }
    Err(e) => {
      context
        .log_warn(&format!("Stored {ingested} records but could not count the store: {e}"), "records-api")
        .await;
      None
    }
  };

  let response = IngestResponse { ingested, total_records };
  Ok(ResponseJson(BaseResponse::success(response, context.request_id)))
}

/// GET /api/database/info - Store kind, metric and record count
pub async fn database_info(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
) -> ApiResult<DatabaseInfoResponse> {
  match state.rag.count().await {
    Ok(record_count) => {
      let response = DatabaseInfoResponse {
        store: state.rag.store_kind().to_string(),
        metric: state.rag.metric(),
        record_count,
      };
      Ok(ResponseJson(BaseResponse::success(response, context.request_id)))
    }
    Err(e) => {
      log_failure(&context, &e, "database-api").await;
      Err(error_response(&e, context.request_id))
    }
  }
}

/// DELETE /api/database/clear - Remove every stored record
pub async fn clear_database(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
) -> ApiResult<ClearResponse> {
  let outcome = match state.rag.count().await {
    Ok(removed) => state.rag.clear().await.map(|_| removed),
    Err(e) => Err(e),
  };

  match outcome {
    Ok(removed) => {
      context.log_warn(&format!("Cleared {removed} records from the store"), "database-api").await;
      Ok(ResponseJson(BaseResponse::success(ClearResponse { removed }, context.request_id)))
    }
    Err(e) => {
      log_failure(&context, &e, "database-api").await;
      Err(error_response(&e, context.request_id))
    }
  }
}
