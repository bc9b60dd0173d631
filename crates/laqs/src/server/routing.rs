//! Axum router configuration for all endpoints

use axum::{
  middleware,
  routing::{delete, get, post},
  Router,
};

use crate::server::handlers::{chat, database, logs, search, status};
use crate::server::middleware::request_context_middleware;
use crate::server::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
  Router::new()
    // Status endpoints
    .route("/", get(status::root))
    .route("/health", get(status::health))
    .route("/api", get(status::api_info))
    .route("/logs", get(logs::get_logs))
    // Retrieval endpoints
    .route("/api/search", post(search::search))
    .route("/api/chat", post(chat::chat))
    // Corpus management
    .route("/api/records", post(database::ingest_records))
    .route("/api/database/info", get(database::database_info))
    .route("/api/database/clear", delete(database::clear_database))
    .layer(middleware::from_fn_with_state(state.clone(), request_context_middleware))
    .with_state(state)
}
