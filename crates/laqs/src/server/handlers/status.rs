//! Root, health and API description handlers

use axum::{
  extract::{Extension, State},
  response::Json,
};
use schemars::schema_for;

use crate::server::middleware::RequestContext;
use crate::server::types::{
  ApiInfoResponse, ApiVersions, BaseResponse, ChatRequest, HealthResponse, IngestRequest,
  RootResponse, SearchRequest,
};
use crate::server::AppState;

/// GET / - Service banner
pub async fn root(Extension(context): Extension<RequestContext>) -> Json<BaseResponse<RootResponse>> {
  let response = RootResponse {
    service: "LAQ RAG API".to_string(),
    version: env!("CARGO_PKG_VERSION").to_string(),
    health: "/health".to_string(),
    api: "/api".to_string(),
  };
  Json(BaseResponse::success(response, context.request_id))
}

/// GET /health - Store reachability and model configuration
pub async fn health(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
) -> Json<BaseResponse<HealthResponse>> {
  let (status, record_count) = match state.rag.count().await {
    Ok(count) => ("healthy", Some(count)),
    Err(e) => {
      context.log_warn(&format!("Health check could not reach store: {e}"), "status-api").await;
      ("degraded", None)
    }
  };

  let response = HealthResponse {
    status: status.to_string(),
    version: env!("CARGO_PKG_VERSION").to_string(),
    store: state.rag.store_kind().to_string(),
    record_count,
    models: state.info.as_ref().clone(),
  };
  Json(BaseResponse::success(response, context.request_id))
}

/// GET /api - Supported versions and request body schemas
pub async fn api_info(Extension(context): Extension<RequestContext>) -> Json<BaseResponse<ApiInfoResponse>> {
  let version = env!("CARGO_PKG_VERSION");
  let schemas = serde_json::json!({
    "/api/search": schema_for!(SearchRequest),
    "/api/chat": schema_for!(ChatRequest),
    "/api/records": schema_for!(IngestRequest),
  });

  let response = ApiInfoResponse {
    latest: version.to_string(),
    versions: ApiVersions { latest: version.to_string(), active: vec![version.to_string()] },
    schemas,
  };
  Json(BaseResponse::success(response, context.request_id))
}
