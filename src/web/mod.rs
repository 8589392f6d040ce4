// Web server: Axum JSON API plus a server-sent-events live feed.
//
// Submissions are answered with 202 as soon as the Pending record is
// stored; classification finishes in the background and reaches
// clients through GET /api/feed.
//
// No authentication layer. Deletion is only available from the CLI.

use std::sync::Arc;

use anyhow::Result;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::assistant::Assistant;
use crate::config::Config;
use crate::db::ReportStore;
use crate::pipeline::submission::SubmissionPipeline;
use crate::verification::ai::AiClassifier;
use crate::verification::llm::LlmError;
use crate::verification::traits::Classifier;
use crate::verification::{build_classifier, gateway_client};

pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ReportStore>,
    pub pipeline: SubmissionPipeline,
    /// Present when a gateway key is configured; used by POST /api/verify.
    pub ai: Option<Arc<AiClassifier>>,
    /// Present when a gateway key is configured; used by POST /api/chat.
    pub assistant: Option<Arc<Assistant>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ReportStore>,
        classifier: Arc<dyn Classifier>,
        ai: Option<Arc<AiClassifier>>,
        assistant: Option<Arc<Assistant>>,
    ) -> Self {
        Self {
            pipeline: SubmissionPipeline::new(store.clone(), classifier),
            store,
            ai,
            assistant,
        }
    }

    /// Wire up state from configuration. Without an API key the server
    /// still runs: submissions use the heuristic scorer, /api/verify
    /// answers heuristically and /api/chat reports itself unavailable.
    pub fn from_config(config: &Config, store: Arc<dyn ReportStore>) -> Result<Self> {
        config.require_classifier()?;
        let classifier = build_classifier(config)?;

        let (ai, assistant) = if config.ai_api_key.is_empty() {
            warn!("SAHAYAK_AI_API_KEY not set, AI verification and help assistant disabled");
            (None, None)
        } else {
            let client = gateway_client(config)?;
            let ai = AiClassifier::new(Arc::new(client.with_model(&config.ai_model)));
            let assistant = Assistant::new(Arc::new(client.with_model(&config.chat_model)));
            (Some(Arc::new(ai)), Some(Arc::new(assistant)))
        };

        Ok(Self::new(store, classifier, ai, assistant))
    }
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(
    config: Config,
    store: Arc<dyn ReportStore>,
    port: u16,
    bind: &str,
) -> Result<()> {
    let state = AppState::from_config(&config, store)?;
    info!(
        classifier = state.pipeline.classifier().name(),
        "Submission pipeline ready"
    );

    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("Sahayak API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/reports",
            get(handlers::reports::list_reports).post(handlers::reports::create_report),
        )
        .route("/api/reports/{id}", get(handlers::reports::get_report))
        .route("/api/feed", get(handlers::feed::live_feed))
        .route("/api/stats", get(handlers::stats::get_stats))
        .route("/api/verify", post(handlers::verify::verify_message))
        .route("/api/chat", post(handlers::chat::chat));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check: always returns 200 OK.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}

/// Map a model-gateway failure on a synchronous endpoint to a response.
/// Rate limiting and an exhausted quota keep their own status codes.
pub fn llm_error_response(err: &LlmError) -> Response {
    match err {
        LlmError::RateLimited => api_error(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please try again later.",
        ),
        LlmError::QuotaExhausted => api_error(
            StatusCode::PAYMENT_REQUIRED,
            "AI credits exhausted. Please add credits.",
        ),
        LlmError::Timeout => api_error(StatusCode::GATEWAY_TIMEOUT, "AI service timed out"),
        _ => api_error(StatusCode::BAD_GATEWAY, "AI service unavailable"),
    }
}
