//! Request context and middleware for the LAQs REST API
//!
//! Every request gets a `RequestContext` carrying its id, metadata and the
//! shared request log; handlers pull it out with `Extension`.

use axum::{
  extract::{Request, State},
  http::{HeaderMap, Method, Uri},
  middleware::Next,
  response::Response,
};
use std::time::Instant;
use uuid::Uuid;

use crate::server::request_log::{LogContext, RequestLog};
use crate::server::AppState;

/// Request context containing logger and request metadata
#[derive(Clone)]
pub struct RequestContext {
  /// Unique ID for this request, reported as the transaction id
  pub request_id: Uuid,
  pub method: Method,
  pub uri: Uri,
  pub headers: HeaderMap,
  pub logger: RequestLog,
}

impl RequestContext {
  pub fn new(method: Method, uri: Uri, headers: HeaderMap, logger: RequestLog) -> Self {
    Self { request_id: Uuid::new_v4(), method, uri, headers, logger }
  }

  pub async fn log_info(&self, message: &str, component: &str) {
    self.log_with_context(message, "info", component, None, None).await;
  }

  pub async fn log_success(&self, message: &str, component: &str) {
    self.log_with_context(message, "success", component, None, None).await;
  }

  pub async fn log_warn(&self, message: &str, component: &str) {
    self.log_with_context(message, "warn", component, None, None).await;
  }

  pub async fn log_error(&self, message: &str, component: &str) {
    self.log_with_context(message, "error", component, None, None).await;
  }

  /// Log with the request's structured context attached
  pub async fn log_with_context(
    &self,
    message: &str,
    level: &str,
    component: &str,
    status_code: Option<u16>,
    duration_ms: Option<f64>,
  ) {
    let context = LogContext {
      request_id: Some(self.request_id.to_string()),
      method: Some(self.method.to_string()),
      path: Some(self.uri.path().to_string()),
      user_agent: self.user_agent(),
      duration_ms,
      status_code,
    };
    self.logger.log(level, message, component, Some(context)).await;
  }

  fn user_agent(&self) -> Option<String> {
    self.headers.get("user-agent").map(|v| v.to_str().unwrap_or("unknown").to_string())
  }

  pub async fn log_request_start(&self) {
    self.log_with_context("Request started", "debug", "http-request", None, None).await;
  }

  pub async fn log_request_complete(&self, status_code: u16, duration_ms: f64) {
    let level = if status_code >= 500 {
      "error"
    } else if status_code >= 400 {
      "warn"
    } else {
      "info"
    };
    self
      .log_with_context("Request completed", level, "http-request", Some(status_code), Some(duration_ms))
      .await;
  }
}

/// Middleware to inject RequestContext into all requests
pub async fn request_context_middleware(
  State(state): State<AppState>,
  mut request: Request,
  next: Next,
) -> Response {
  let context = RequestContext::new(
    request.method().clone(),
    request.uri().clone(),
    request.headers().clone(),
    state.logs.clone(),
  );

  let start_time = Instant::now();
  context.log_request_start().await;

  request.extensions_mut().insert(context.clone());
  let response = next.run(request).await;

  let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
  context.log_request_complete(response.status().as_u16(), duration_ms).await;

  response
}
