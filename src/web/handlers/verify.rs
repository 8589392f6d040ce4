// POST /api/verify: classify a message without storing it.
//
// Uses the language model when one is configured. A rate limit (429) or
// exhausted quota (402) is returned to the caller; any other gateway
// failure degrades to the heuristic scorer like the background path does.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use crate::verification::heuristic;
use crate::web::{api_error, llm_error_response, AppState};

#[derive(Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub location: String,
}

pub async fn verify_message(
    State(state): State<AppState>,
    Json(req): Json<VerifyRequest>,
) -> Response {
    let message = req.message.trim();
    let location = req.location.trim();
    if message.is_empty() || location.is_empty() {
        return api_error(StatusCode::BAD_REQUEST, "Message and location are required");
    }

    let result = match state.ai {
        Some(ref ai) => match ai.classify_strict(message, location).await {
            Ok(result) => result,
            Err(e) if e.is_user_facing() => return llm_error_response(&e),
            Err(e) => {
                warn!(error = %e, "AI verification failed, using heuristic scorer");
                heuristic::score(message, location)
            }
        },
        None => heuristic::score(message, location),
    };

    Json(result).into_response()
}
