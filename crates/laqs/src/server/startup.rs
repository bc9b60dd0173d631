//! REST server startup and configuration

use anyhow::{anyhow, Result};
use axum::serve;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{Config, StoreBackend};
use crate::rag::RagService;
use crate::server::request_log::RequestLog;
use crate::server::routing::create_router;
use crate::server::types::ServiceInfo;
use crate::server::AppState;
use crate::services::{MemoryVectorStore, OllamaEmbeddingClient, OllamaLlmClient, VectorStore};

const COMPONENT: &str = "laqs-server";

/// Wire the Ollama clients, the configured store and the request log
pub async fn build_state(config: &Config) -> Result<AppState> {
  let store = open_store(config).await?;
  let embeddings = OllamaEmbeddingClient::new(&config.ollama_url, &config.embedding_model);
  let llm = OllamaLlmClient::new(&config.ollama_url, &config.llm_model, config.generation_options());

  let rag = RagService::new(
    Arc::new(embeddings),
    store,
    Arc::new(llm),
    config.retrieval_settings(),
  );
  let logs = RequestLog::new(config.request_log_path())?;
  let info = ServiceInfo {
    ollama_url: config.ollama_url.clone(),
    llm_model: config.llm_model.clone(),
    embedding_model: config.embedding_model.clone(),
  };

  Ok(AppState::new(Arc::new(rag), logs, info))
}

async fn open_store(config: &Config) -> Result<Arc<dyn VectorStore>> {
  match config.store {
    StoreBackend::Memory => Ok(Arc::new(MemoryVectorStore::open(config.snapshot_path())?)),
    #[cfg(feature = "lancedb-store")]
    StoreBackend::Lancedb => {
      let store = crate::services::lancedb::LanceDbVectorStore::open(config.lancedb_path()).await?;
      Ok(Arc::new(store))
    }
    #[cfg(not(feature = "lancedb-store"))]
    StoreBackend::Lancedb => {
      Err(anyhow!("The lancedb store needs a build with the `lancedb-store` feature"))
    }
  }
}

/// Start the REST server
pub async fn start_server(addr: SocketAddr, state: AppState) -> Result<()> {
  let logs = state.logs.clone();
  logs.info(&format!("Starting LAQs REST server on {addr}"), COMPONENT).await;

  let app = create_router(state)
    .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()));

  let listener = TcpListener::bind(addr).await?;
  logs.info(&format!("Server listening on {addr}"), COMPONENT).await;

  match serve(listener, app).await {
    Ok(_) => {
      logs.info("Server shutdown gracefully", COMPONENT).await;
      Ok(())
    }
    Err(e) => {
      logs.error(&format!("Server error: {e}"), COMPONENT).await;
      Err(anyhow!("Server error: {}", e))
    }
  }
}
