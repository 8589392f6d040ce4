// GET /api/stats: dashboard aggregates. All-time status totals plus the
// recent timeline window.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use crate::analytics;
use crate::web::{api_error, AppState};

pub async fn get_stats(State(state): State<AppState>) -> Response {
    match analytics::load(state.store.as_ref(), Utc::now()).await {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "DB error computing stats");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}
