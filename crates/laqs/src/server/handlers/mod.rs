//! Endpoint handlers

pub mod chat;
pub mod database;
pub mod logs;
pub mod search;
pub mod status;

use axum::{http::StatusCode, response::Json as ResponseJson};
use uuid::Uuid;

use crate::error::RagError;
use crate::server::middleware::RequestContext;
use crate::server::types::{ApiError, BaseResponse};

/// Handler result: enveloped data, or a status code with an enveloped error
pub type ApiResult<T> =
  Result<ResponseJson<BaseResponse<T>>, (StatusCode, ResponseJson<BaseResponse<()>>)>;

/// Map a domain error onto its HTTP status and error envelope
pub fn error_response(err: &RagError, transaction_id: Uuid) -> (StatusCode, ResponseJson<BaseResponse<()>>) {
  let status =
    if err.is_client_error() { StatusCode::BAD_REQUEST } else { StatusCode::INTERNAL_SERVER_ERROR };
  let error = ApiError::new(err.key(), &err.to_string());
  (status, ResponseJson(BaseResponse::<()>::error(vec![error], transaction_id)))
}

/// Log a failed operation at warn for caller faults, error for upstream faults
pub async fn log_failure(context: &RequestContext, err: &RagError, component: &str) {
  if err.is_client_error() {
    context.log_warn(&format!("Rejected request: {err}"), component).await;
  } else {
    context.log_error(&err.to_string(), component).await;
  }
}

/// Requested result count, or the server default when omitted
pub fn resolve_top_k(requested: Option<i64>, default: usize) -> Result<usize, RagError> {
  match requested {
    None => Ok(default),
    Some(value) if value > 0 => Ok(value as usize),
    Some(value) => Err(RagError::invalid(format!("top_k must be a positive integer, got {value}"))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_resolve_top_k() {
    assert_eq!(resolve_top_k(None, 5).unwrap(), 5);
    assert_eq!(resolve_top_k(Some(12), 5).unwrap(), 12);
    assert!(resolve_top_k(Some(0), 5).unwrap_err().is_client_error());
    assert!(resolve_top_k(Some(-4), 5).unwrap_err().is_client_error());
  }

  #[test]
  fn test_error_status_mapping() {
    let id = Uuid::nil();
    assert_eq!(error_response(&RagError::invalid("empty"), id).0, StatusCode::BAD_REQUEST);
    assert_eq!(error_response(&RagError::retrieval("down"), id).0, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, body) = error_response(&RagError::generation("model missing"), id);
    assert_eq!(body.0.errors[0].key, "generation_failed");
    assert_eq!(body.0.errors[0].message, "Generation failed: model missing");
  }
}
