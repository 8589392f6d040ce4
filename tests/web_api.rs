//! HTTP API tests: only compiled with `--features web`.
//!
//! Requests go straight into the router with `tower::ServiceExt::oneshot`;
//! no socket is opened and no model gateway is contacted.

#![cfg(feature = "web")]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use sahayak::assistant::Assistant;
use sahayak::db::{memory_store, ReportStore};
use sahayak::verification::ai::AiClassifier;
use sahayak::verification::heuristic::{self, HeuristicClassifier};
use sahayak::verification::llm::{ChatMessage, ChatModel, LanguageModel, LlmError};
use sahayak::web::{build_router, AppState};

struct StubModel {
    answer: fn() -> Result<String, LlmError>,
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete(&self, _: &str, _: &str) -> Result<String, LlmError> {
        (self.answer)()
    }
}

#[async_trait]
impl ChatModel for StubModel {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        (self.answer)().map(|a| format!("{a} ({} turns)", messages.len()))
    }
}

fn app_with(store: Arc<dyn ReportStore>) -> Router {
    build_router(AppState::new(
        store,
        Arc::new(HeuristicClassifier::default()),
        None,
        None,
    ))
}

/// Router whose language model and help assistant both answer with `answer`.
fn app_with_model(answer: fn() -> Result<String, LlmError>) -> Router {
    let ai = AiClassifier::new(Arc::new(StubModel { answer }));
    let assistant = Assistant::new(Arc::new(StubModel { answer }));
    build_router(AppState::new(
        memory_store().unwrap(),
        Arc::new(HeuristicClassifier::default()),
        Some(Arc::new(ai)),
        Some(Arc::new(assistant)),
    ))
}

fn app() -> Router {
    app_with(memory_store().unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn flood_report() -> Value {
    json!({
        "message": "Family of 4 trapped on 2nd floor due to rising flood water, need rescue boat",
        "location": "45 River Street, near old market",
        "latitude": 19.076,
        "longitude": 72.8777
    })
}

// ============================================================
// Reports
// ============================================================

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = send(app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn submission_is_accepted_as_pending() {
    let (status, body) = send(app(), post_json("/api/reports", flood_report())).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["classification"], "Pending");
    assert_eq!(body["rationale"], "Analyzing...");
    assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn invalid_submission_lists_fields() {
    let (status, body) = send(
        app(),
        post_json("/api/reports", json!({ "message": "help", "latitude": 12.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["message", "location", "coordinates"]);
}

#[tokio::test]
async fn submitted_report_can_be_fetched_and_listed() {
    let store = memory_store().unwrap();
    let (_, created) = send(
        app_with(store.clone()),
        post_json("/api/reports", flood_report()),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(app_with(store.clone()), get(&format!("/api/reports/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());

    let (status, body) = send(app_with(store.clone()), get("/api/reports?q=river&limit=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reports"].as_array().unwrap().len(), 1);
    assert_eq!(body["limit"], 5);

    let (_, body) = send(app_with(store), get("/api/reports?q=cyclone")).await;
    assert!(body["reports"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_report_is_404() {
    let (status, body) = send(app(), get("/api/reports/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Report not found");
}

#[tokio::test]
async fn unknown_status_filter_is_400() {
    let (status, _) = send(app(), get("/api/reports?status=urgent")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn hours_filter_beyond_representable_time_is_400() {
    let (status, body) = send(app(), get("/api/reports?hours=4294967295")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "hours out of range");

    let (status, _) = send(app(), get("/api/reports?hours=24")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn stats_count_stored_reports() {
    let store = memory_store().unwrap();
    send(app_with(store.clone()), post_json("/api/reports", flood_report())).await;

    let (status, body) = send(app_with(store), get("/api/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["timeline"].as_array().unwrap().len(), 7);
    assert_eq!(body["by_status"].as_array().unwrap().len(), 4);
}

// ============================================================
// Synchronous verification
// ============================================================

fn verify_body() -> Value {
    json!({
        "message": "URGENT!!! Send money to help victims!!! Western Union only!!!",
        "location": "Unknown area"
    })
}

#[tokio::test]
async fn verify_without_model_uses_heuristic() {
    let (status, body) = send(app(), post_json("/api/verify", verify_body())).await;
    assert_eq!(status, StatusCode::OK);
    let expected = heuristic::score(
        "URGENT!!! Send money to help victims!!! Western Union only!!!",
        "Unknown area",
    );
    assert_eq!(body["status"], expected.status.as_str());
    assert_eq!(body["reason"], expected.reason.as_str());
}

#[tokio::test]
async fn verify_requires_message_and_location() {
    let (status, body) = send(app(), post_json("/api/verify", json!({ "message": "flood" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message and location are required");
}

#[tokio::test]
async fn verify_uses_model_answer() {
    let app = app_with_model(|| {
        Ok(r#"{"status": "High Scam Probability", "confidence": 0.93, "reason": "Wire transfer request."}"#
            .to_string())
    });
    let (status, body) = send(app, post_json("/api/verify", verify_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "High Scam Probability");
    assert_eq!(body["confidence"], 0.93);
}

#[tokio::test]
async fn verify_surfaces_rate_limit_and_quota() {
    let limited = app_with_model(|| Err(LlmError::RateLimited));
    let (status, body) = send(limited, post_json("/api/verify", verify_body())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Rate limit exceeded. Please try again later.");

    let broke = app_with_model(|| Err(LlmError::QuotaExhausted));
    let (status, body) = send(broke, post_json("/api/verify", verify_body())).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"], "AI credits exhausted. Please add credits.");
}

#[tokio::test]
async fn verify_degrades_on_other_upstream_errors() {
    let app = app_with_model(|| Err(LlmError::Timeout));
    let (status, body) = send(app, post_json("/api/verify", verify_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "High Scam Probability");
}

// ============================================================
// Help assistant
// ============================================================

#[tokio::test]
async fn chat_unavailable_without_key() {
    let (status, _) = send(app(), post_json("/api/chat", json!({ "message": "hi" }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn chat_forwards_history() {
    let app = app_with_model(|| Ok("Tap Submit".to_string()));
    let (status, body) = send(
        app,
        post_json(
            "/api/chat",
            json!({
                "message": "How do I send my location?",
                "conversationHistory": [
                    { "role": "user", "content": "hello" },
                    { "role": "assistant", "content": "Hi! How can I help?" }
                ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // system prompt + two history turns + new question
    assert_eq!(body["reply"], "Tap Submit (4 turns)");
}

#[tokio::test]
async fn chat_surfaces_rate_limit() {
    let app = app_with_model(|| Err(LlmError::RateLimited));
    let (status, _) = send(app, post_json("/api/chat", json!({ "message": "hi" }))).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn chat_requires_message() {
    let app = app_with_model(|| Ok("x".to_string()));
    let (status, _) = send(app, post_json("/api/chat", json!({ "message": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
