//! Ollama clients against a fake Ollama server bound to a local port

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use laqs::services::llm::GenerationOptions;
use laqs::services::{EmbeddingClient, LlmClient, OllamaEmbeddingClient, OllamaLlmClient};

async fn spawn(router: Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr: SocketAddr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, router).await.unwrap();
  });
  format!("http://{addr}/")
}

/// Echoes the request back inside the response so tests can inspect it
fn fake_ollama() -> Router {
  Router::new()
    .route(
      "/api/embeddings",
      post(|Json(body): Json<Value>| async move {
        let length = body["prompt"].as_str().unwrap_or_default().len() as f64;
        let model_marker = if body["model"] == "nomic-embed-text" { 1.0 } else { -1.0 };
        Json(json!({ "embedding": [length, model_marker, 0.5] }))
      }),
    )
    .route(
      "/api/generate",
      post(|Json(body): Json<Value>| async move {
        let answer = format!(
          "model={} stream={} temperature={} top_p={} prompt={}",
          body["model"].as_str().unwrap_or_default(),
          body["stream"],
          body["options"]["temperature"],
          body["options"]["top_p"],
          body["prompt"].as_str().unwrap_or_default()
        );
        Json(json!({ "model": body["model"], "response": answer, "done": true }))
      }),
    )
}

fn broken_ollama() -> Router {
  Router::new()
    .route(
      "/api/embeddings",
      post(|| async { (StatusCode::NOT_FOUND, "model \"nomic-embed-text\" not found") }),
    )
    .route("/api/generate", post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "out of memory") }))
}

// Embeddings
// ==========

#[tokio::test]
async fn test_embedding_request_and_response() {
  let base_url = spawn(fake_ollama()).await;
  let client = OllamaEmbeddingClient::new(base_url, "nomic-embed-text");

  let embedding = client.embed("Question: budget\nAnswer: ").await.unwrap();

  assert_eq!(embedding, vec![25.0, 1.0, 0.5]);
  assert_eq!(client.model(), "nomic-embed-text");
}

#[tokio::test]
async fn test_embedding_error_status_carries_body() {
  let base_url = spawn(broken_ollama()).await;
  let client = OllamaEmbeddingClient::new(base_url, "nomic-embed-text");

  let err = client.embed("budget").await.unwrap_err().to_string();
  assert!(err.contains("404"), "{err}");
  assert!(err.contains("not found"), "{err}");
}

#[tokio::test]
async fn test_empty_embedding_vector_is_an_error() {
  let router = Router::new().route("/api/embeddings", post(|| async { Json(json!({ "embedding": [] })) }));
  let base_url = spawn(router).await;
  let client = OllamaEmbeddingClient::new(base_url, "nomic-embed-text");

  assert!(client.embed("budget").await.is_err());
}

#[tokio::test]
async fn test_unreachable_server_is_an_error() {
  // Bind then release a port so nothing is listening on it
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let client = OllamaEmbeddingClient::new(format!("http://{addr}"), "nomic-embed-text");
  let err = client.embed("budget").await.unwrap_err().to_string();
  assert!(err.contains("Embedding request failed"), "{err}");
}

// Generation
// ==========

#[tokio::test]
async fn test_generate_sends_non_streaming_request_with_options() {
  let base_url = spawn(fake_ollama()).await;
  let options = GenerationOptions { temperature: 0.5, top_p: 0.25 };
  let client = OllamaLlmClient::new(base_url, "llama3.2", options);

  let answer = client.generate("Answer:").await.unwrap();

  assert_eq!(answer, "model=llama3.2 stream=false temperature=0.5 top_p=0.25 prompt=Answer:");
  assert_eq!(client.model(), "llama3.2");
}

#[tokio::test]
async fn test_generate_error_status_is_an_error() {
  let base_url = spawn(broken_ollama()).await;
  let client = OllamaLlmClient::new(base_url, "llama3.2", GenerationOptions { temperature: 0.1, top_p: 0.9 });

  let err = client.generate("prompt").await.unwrap_err().to_string();
  assert!(err.contains("500"), "{err}");
  assert!(err.contains("out of memory"), "{err}");
}
