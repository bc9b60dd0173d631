//! Grounded chat handler

use axum::{
  extract::{Extension, Json, State},
  response::Json as ResponseJson,
};

use crate::server::handlers::{error_response, log_failure, resolve_top_k, ApiResult};
use crate::server::middleware::RequestContext;
use crate::server::types::{BaseResponse, ChatRequest, ChatResponse, SearchResultData};
use crate::server::AppState;

/// POST /api/chat - LLM answer grounded on the most relevant LAQs
pub async fn chat(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
  context.log_info(&format!("Chat question: {:?}", request.question), "chat-api").await;

  let outcome = match resolve_top_k(request.top_k, state.rag.settings().chat_top_k) {
    Ok(top_k) => state.rag.chat(&request.question, Some(top_k)).await,
    Err(e) => Err(e),
  };

  match outcome {
    Ok(answer) => {
      context
        .log_success(&format!("Answered from {} sources", answer.sources.len()), "chat-api")
        .await;

      let response = ChatResponse {
        question: request.question,
        answer: answer.answer,
        sources: answer.sources.into_iter().map(SearchResultData::from).collect(),
      };
      Ok(ResponseJson(BaseResponse::success(response, context.request_id)))
    }
    Err(e) => {
      log_failure(&context, &e, "chat-api").await;
      Err(error_response(&e, context.request_id))
    }
  }
}
