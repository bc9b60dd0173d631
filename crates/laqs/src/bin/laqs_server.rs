//! LAQs REST Server
//!
//! Semantic search and grounded chat over Legislative Assembly Questions,
//! backed by a local Ollama server.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use laqs::config::ConfigArgs;
use laqs::server::startup::{build_state, start_server};

#[tokio::main]
async fn main() -> Result<()> {
  let args = ConfigArgs::parse();

  // Lance and its query engine are noisy at info
  let filter = if args.verbose {
    EnvFilter::new("debug,lance=warn,lance_datafusion=warn,datafusion=warn,hyper=info")
  } else {
    EnvFilter::try_from_default_env()
      .unwrap_or_else(|_| EnvFilter::new("laqs=info,tower_http=info,lance=error,datafusion=error,warn"))
  };
  tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

  let config = args.resolve()?;
  tracing::info!("Starting LAQs REST Server v{}", env!("CARGO_PKG_VERSION"));
  tracing::info!(
    store = ?config.store,
    llm = %config.llm_model,
    embeddings = %config.embedding_model,
    "Binding to address: {}",
    config.bind
  );

  let state = build_state(&config).await?;
  start_server(config.bind, state).await?;

  Ok(())
}
