// POST /api/chat: help assistant.
//
// Body: { "message": "...", "conversation_history": [{ "role", "content" }] }
// Reply: { "reply": "..." }

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::verification::llm::ChatMessage;
use crate::web::{api_error, llm_error_response, AppState};

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "conversationHistory")]
    pub conversation_history: Vec<ChatMessage>,
}

pub async fn chat(State(state): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    let Some(ref assistant) = state.assistant else {
        return api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "Help assistant is not configured",
        );
    };

    if req.message.trim().is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "Message is required");
    }

    match assistant.reply(&req.conversation_history, &req.message).await {
        Ok(reply) => Json(serde_json::json!({ "reply": reply })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Help assistant request failed");
            llm_error_response(&e)
        }
    }
}
