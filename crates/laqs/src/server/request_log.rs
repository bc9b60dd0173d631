//! Persistent request log
//!
//! Append-only JSONL file guarded by an async mutex. Every entry is also
//! mirrored to `tracing` unless the log was opened silent.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

// Types
// =====

/// Request context attached to a log entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LogContext {
  /// Request ID for correlation
  #[serde(skip_serializing_if = "Option::is_none")]
  pub request_id: Option<String>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub method: Option<String>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub user_agent: Option<String>,

  /// Request duration in milliseconds
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duration_ms: Option<f64>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub status_code: Option<u16>,
}

/// One line of the request log
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LogEntry {
  pub timestamp: DateTime<Utc>,
  pub level: String,
  pub message: String,
  pub component: String,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub context: Option<LogContext>,
}

struct RequestLogInner {
  path: PathBuf,
  silent: bool,
}

/// Thread-safe JSONL request log
#[derive(Clone)]
pub struct RequestLog {
  inner: Arc<Mutex<RequestLogInner>>,
}

// File Operations
// ===============

impl RequestLogInner {
  fn new(path: &Path, silent: bool) -> std::io::Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
      File::create(path)?;
    }
    Ok(Self { path: path.to_path_buf(), silent })
  }

  fn append(&mut self, entry: &LogEntry) -> std::io::Result<()> {
    let line = serde_json::to_string(entry)
      .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
    writeln!(file, "{line}")?;
    file.flush()
  }

  /// Most recent `limit` entries matching `level`, oldest first
  fn read(&self, limit: Option<usize>, level: Option<&str>) -> std::io::Result<Vec<LogEntry>> {
    if !self.path.exists() {
      return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(&self.path)?);
    let mut entries = Vec::new();
    for line in reader.lines() {
      let line = line?;
      if line.trim().is_empty() {
        continue;
      }
      // Malformed lines are skipped
      let Ok(entry) = serde_json::from_str::<LogEntry>(&line) else {
        continue;
      };
      if level.is_none_or(|filter| filter == "all" || entry.level == filter) {
        entries.push(entry);
      }
    }

    if let Some(limit) = limit {
      let skip = entries.len().saturating_sub(limit);
      entries.drain(..skip);
    }
    Ok(entries)
  }
}

// Core API
// ========

impl RequestLog {
  pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
    Self::new_with_silent(path, false)
  }

  /// Open a log that writes to disk only
  pub fn new_with_silent(path: impl AsRef<Path>, silent: bool) -> std::io::Result<Self> {
    let inner = RequestLogInner::new(path.as_ref(), silent)?;
    Ok(Self { inner: Arc::new(Mutex::new(inner)) })
  }

  pub async fn add_log(
    &self,
    level: &str,
    message: &str,
    component: &str,
    context: Option<LogContext>,
  ) -> std::io::Result<()> {
    let entry = LogEntry {
      timestamp: Utc::now(),
      level: level.to_string(),
      message: message.to_string(),
      component: component.to_string(),
      context,
    };

    let mut guard = self.inner.lock().await;
    if !guard.silent {
      mirror_to_tracing(&entry);
    }
    guard.append(&entry)
  }

  /// Fire-and-forget variant of [`RequestLog::add_log`]
  pub async fn log(&self, level: &str, message: &str, component: &str, context: Option<LogContext>) {
    if let Err(e) = self.add_log(level, message, component, context).await {
      tracing::warn!("Failed to write request log: {}", e);
    }
  }

  pub async fn info(&self, message: &str, component: &str) {
    self.log("info", message, component, None).await;
  }

  pub async fn error(&self, message: &str, component: &str) {
    self.log("error", message, component, None).await;
  }

  /// Read entries; `level` of `None` or `"all"` matches everything
  pub async fn get_logs(
    &self,
    limit: Option<usize>,
    level: Option<&str>,
  ) -> std::io::Result<Vec<LogEntry>> {
    let guard = self.inner.lock().await;
    guard.read(limit, level)
  }

  pub async fn log_file_path(&self) -> PathBuf {
    self.inner.lock().await.path.clone()
  }
}

fn mirror_to_tracing(entry: &LogEntry) {
  let component = entry.component.as_str();
  match entry.level.as_str() {
    "error" => tracing::error!(component, "{}", entry.message),
    "warn" => tracing::warn!(component, "{}", entry.message),
    "debug" => tracing::debug!(component, "{}", entry.message),
    _ => tracing::info!(component, "{}", entry.message),
  }
}

// Tests
// =====
