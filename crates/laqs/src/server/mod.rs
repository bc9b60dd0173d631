//! REST API for LAQ search and chat
//!
//! Uses axum for routing and schemars for request schema generation.

pub mod handlers;
pub mod middleware;
pub mod request_log;
pub mod routing;
pub mod startup;
pub mod types;

use std::sync::Arc;

use crate::rag::RagService;
use request_log::RequestLog;
use types::ServiceInfo;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
  pub rag: Arc<RagService>,
  pub logs: RequestLog,
  pub info: Arc<ServiceInfo>,
}

impl AppState {
  pub fn new(rag: Arc<RagService>, logs: RequestLog, info: ServiceInfo) -> Self {
    Self { rag, logs, info: Arc::new(info) }
  }
}
