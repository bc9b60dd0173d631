//! Server configuration
//!
//! Values resolve in three layers: built-in defaults, an optional YAML file,
//! then command-line flags (each flag also reads a `LAQS_*` environment
//! variable).

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::rag::RetrievalSettings;
use crate::services::llm::GenerationOptions;

/// Which vector store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
  /// In-process store with a JSON snapshot in the data directory
  Memory,
  /// LanceDB table in the data directory (requires the `lancedb-store` feature)
  Lancedb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub bind: SocketAddr,
  pub ollama_url: String,
  pub llm_model: String,
  pub embedding_model: String,
  pub temperature: f32,
  pub top_p: f32,
  pub search_top_k: usize,
  pub chat_top_k: usize,
  pub candidate_ceiling: usize,
  pub recency_cutoff_year: i32,
  pub relevance_threshold: f32,
  pub store: StoreBackend,
  pub data_dir: PathBuf,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
      ollama_url: "http://localhost:11434".to_string(),
      llm_model: "llama3.2".to_string(),
      embedding_model: "nomic-embed-text".to_string(),
      temperature: 0.1,
      top_p: 0.9,
      search_top_k: 5,
      chat_top_k: 5,
      candidate_ceiling: 30,
      recency_cutoff_year: 2024,
      relevance_threshold: 40.0,
      store: StoreBackend::Memory,
      data_dir: default_data_dir(),
    }
  }
}

impl Config {
  /// Load a YAML config file; missing keys keep their defaults
  pub fn from_file(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path)
      .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_yaml::from_str(&content)
      .with_context(|| format!("Failed to parse config file {}", path.display()))
  }

  pub fn validate(&self) -> Result<()> {
    if self.search_top_k == 0 || self.chat_top_k == 0 {
      bail!("search_top_k and chat_top_k must be greater than zero");
    }
    if self.candidate_ceiling == 0 {
      bail!("candidate_ceiling must be greater than zero");
    }
    if !(0.0..=100.0).contains(&self.relevance_threshold) {
      bail!("relevance_threshold must be between 0 and 100, got {}", self.relevance_threshold);
    }
    if !(0.0..=2.0).contains(&self.temperature) {
      bail!("temperature must be between 0 and 2, got {}", self.temperature);
    }
    if !(0.0..=1.0).contains(&self.top_p) {
      bail!("top_p must be between 0 and 1, got {}", self.top_p);
    }
    if self.ollama_url.trim().is_empty() {
      return Err(anyhow!("ollama_url cannot be empty"));
    }
    Ok(())
  }

  pub fn retrieval_settings(&self) -> RetrievalSettings {
    RetrievalSettings {
      search_top_k: self.search_top_k,
      chat_top_k: self.chat_top_k,
      candidate_ceiling: self.candidate_ceiling,
      recency_cutoff_year: self.recency_cutoff_year,
      relevance_threshold: self.relevance_threshold,
    }
  }

  pub fn generation_options(&self) -> GenerationOptions {
    GenerationOptions { temperature: self.temperature, top_p: self.top_p }
  }

  pub fn snapshot_path(&self) -> PathBuf {
    self.data_dir.join("laqs_store.json")
  }

  pub fn lancedb_path(&self) -> PathBuf {
    self.data_dir.join("lancedb")
  }

  pub fn request_log_path(&self) -> PathBuf {
    self.data_dir.join("rest_server.logs.jsonl")
  }
}

fn default_data_dir() -> PathBuf {
  dirs::home_dir().unwrap_or_else(|| Path::new("/tmp").to_path_buf()).join(".laqs")
}

/// Command-line flags for `laqs_server`
#[derive(Debug, Parser)]
#[command(name = "laqs_server")]
#[command(about = "LAQ semantic search and chat REST server")]
#[command(version)]
pub struct ConfigArgs {
  /// YAML config file
  #[arg(long, env = "LAQS_CONFIG")]
  pub config: Option<PathBuf>,

  /// Server bind address
  #[arg(long, env = "LAQS_BIND")]
  pub bind: Option<SocketAddr>,

  /// Ollama base URL
  #[arg(long, env = "LAQS_OLLAMA_URL")]
  pub ollama_url: Option<String>,

  /// LLM used for chat answers
  #[arg(long, env = "LAQS_LLM_MODEL")]
  pub llm_model: Option<String>,

  /// Embedding model
  #[arg(long, env = "LAQS_EMBEDDING_MODEL")]
  pub embedding_model: Option<String>,

  #[arg(long, env = "LAQS_TEMPERATURE")]
  pub temperature: Option<f32>,

  #[arg(long, env = "LAQS_TOP_P")]
  pub top_p: Option<f32>,

  /// Default number of search results
  #[arg(long, env = "LAQS_SEARCH_TOP_K")]
  pub search_top_k: Option<usize>,

  /// Default number of LAQs used to ground a chat answer
  #[arg(long, env = "LAQS_CHAT_TOP_K")]
  pub chat_top_k: Option<usize>,

  /// Most candidates fetched for re-ranking
  #[arg(long, env = "LAQS_CANDIDATE_CEILING")]
  pub candidate_ceiling: Option<usize>,

  /// Records from this year on get the freshness boost
  #[arg(long, env = "LAQS_RECENCY_CUTOFF_YEAR")]
  pub recency_cutoff_year: Option<i32>,

  /// Least similarity (0-100) a record needs to ground a chat answer
  #[arg(long, env = "LAQS_RELEVANCE_THRESHOLD")]
  pub relevance_threshold: Option<f32>,

  #[arg(long, value_enum, env = "LAQS_STORE")]
  pub store: Option<StoreBackend>,

  /// Directory for the store and request logs
  #[arg(long, env = "LAQS_DATA_DIR")]
  pub data_dir: Option<PathBuf>,

  /// Enable verbose logging
  #[arg(short, long)]
  pub verbose: bool,
}

impl ConfigArgs {
  /// Merge defaults, the config file and explicit flags
  pub fn resolve(&self) -> Result<Config> {
    let mut config = match &self.config {
      Some(path) => Config::from_file(path)?,
      None => Config::default(),
    };

    if let Some(bind) = self.bind {
      config.bind = bind;
    }
    if let Some(url) = &self.ollama_url {
      config.ollama_url = url.clone();
    }
    if let Some(model) = &self.llm_model {
      config.llm_model = model.clone();
    }
    if let Some(model) = &self.embedding_model {
      config.embedding_model = model.clone();
    }
    if let Some(temperature) = self.temperature {
      config.temperature = temperature;
    }
    if let Some(top_p) = self.top_p {
      config.top_p = top_p;
    }
    if let Some(top_k) = self.search_top_k {
      config.search_top_k = top_k;
    }
    if let Some(top_k) = self.chat_top_k {
      config.chat_top_k = top_k;
    }
    if let Some(ceiling) = self.candidate_ceiling {
      config.candidate_ceiling = ceiling;
    }
    if let Some(year) = self.recency_cutoff_year {
      config.recency_cutoff_year = year;
    }
    if let Some(threshold) = self.relevance_threshold {
      config.relevance_threshold = threshold;
    }
    if let Some(store) = self.store {
      config.store = store;
    }
    if let Some(dir) = &self.data_dir {
      config.data_dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
  }
}
