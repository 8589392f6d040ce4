// Report submission, listing and detail handlers.
//
// POST /api/reports        validate, store Pending, classify in background
// GET  /api/reports        newest first; ?status= ?hours= ?q= ?limit= ?offset=
// GET  /api/reports/{id}   single report

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::db::models::{hours_before, ReportFilter, VerificationStatus};
use crate::pipeline::submission::SubmitError;
use crate::pipeline::validation::SubmissionInput;
use crate::web::{api_error, AppState};

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 500;

/// POST /api/reports: accept a report. Responds 202 with the Pending record.
pub async fn create_report(
    State(state): State<AppState>,
    Json(input): Json<SubmissionInput>,
) -> Response {
    match state.pipeline.submit(input).await {
        // The classification task keeps running after its handle is dropped.
        Ok(submitted) => (StatusCode::ACCEPTED, Json(submitted.report)).into_response(),
        Err(SubmitError::Validation(errors)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "Invalid submission",
                "fields": errors.0,
            })),
        )
            .into_response(),
        Err(SubmitError::Persistence(e)) => {
            tracing::error!(error = %e, "Failed to store submission");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

#[derive(Deserialize, Default)]
pub struct ReportsQuery {
    /// pending | genuine | verify | scam, or a full status label
    pub status: Option<String>,
    /// Only reports from the last N hours
    pub hours: Option<u32>,
    /// Case-insensitive search in message and location
    pub q: Option<String>,
    /// Results per page (default 50, max 500)
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// GET /api/reports: list reports with optional filters.
pub async fn list_reports(
    State(state): State<AppState>,
    Query(params): Query<ReportsQuery>,
) -> Response {
    let status = match params.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(raw) => match VerificationStatus::from_filter(raw) {
            Some(s) => Some(s),
            None => {
                return api_error(
                    StatusCode::BAD_REQUEST,
                    "Unknown status filter. Use pending, genuine, verify or scam.",
                )
            }
        },
    };

    let since = match params.hours {
        None => None,
        Some(hours) => match hours_before(Utc::now(), hours) {
            Some(t) => Some(t),
            None => return api_error(StatusCode::BAD_REQUEST, "hours out of range"),
        },
    };

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let filter = ReportFilter {
        status,
        since,
        search: params.q.filter(|q| !q.trim().is_empty()),
        limit: Some(limit),
        offset,
        ..Default::default()
    };

    match state.store.query(&filter).await {
        Ok(reports) => Json(serde_json::json!({
            "reports": reports,
            "limit": limit,
            "offset": offset,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "DB error listing reports");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}

/// GET /api/reports/{id}: one report by id.
pub async fn get_report(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.get(&id).await {
        Ok(Some(report)) => Json(report).into_response(),
        Ok(None) => api_error(StatusCode::NOT_FOUND, "Report not found"),
        Err(e) => {
            tracing::error!(error = %e, id = %id, "DB error fetching report");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
        }
    }
}
