// Submission pipeline tests: acknowledgment before classification,
// background updates, duplicate updates and validation, against an
// in-memory SQLite store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Notify};

use sahayak::db::memory_store;
use sahayak::db::models::{
    ChangeKind, DistressReport, NewReport, ReportEvent, ReportFilter, VerificationStatus,
    PENDING_RATIONALE,
};
use sahayak::db::ReportStore;
use sahayak::pipeline::submission::{classify_and_store, SubmissionPipeline, SubmitError};
use sahayak::pipeline::validation::SubmissionInput;
use sahayak::verification::heuristic::HeuristicClassifier;
use sahayak::verification::traits::{ClassificationResult, Classifier, Verdict};

fn flood_input() -> SubmissionInput {
    SubmissionInput {
        message: "Family of 4 trapped on 2nd floor due to rising flood water, need rescue boat"
            .to_string(),
        location: "45 River Street, near old market".to_string(),
        contact: Some("+919876543210".to_string()),
        latitude: Some(19.076),
        longitude: Some(72.8777),
        submitted_by: None,
    }
}

/// Blocks until released, then answers Likely Genuine.
struct GatedClassifier {
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedClassifier {
    fn new() -> Self {
        Self {
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Classifier for GatedClassifier {
    async fn classify(&self, _message: &str, _location: &str) -> ClassificationResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        ClassificationResult {
            status: Verdict::LikelyGenuine,
            confidence: 0.9,
            reason: "Released.".to_string(),
        }
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}

/// Sleeps before answering.
struct SlowClassifier {
    delay: Duration,
}

#[async_trait]
impl Classifier for SlowClassifier {
    async fn classify(&self, message: &str, location: &str) -> ClassificationResult {
        tokio::time::sleep(self.delay).await;
        sahayak::verification::heuristic::score(message, location)
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

/// Store whose inserts always fail.
struct BrokenStore {
    events: broadcast::Sender<ReportEvent>,
}

#[async_trait]
impl ReportStore for BrokenStore {
    async fn table_count(&self) -> Result<i64> {
        Ok(0)
    }
    async fn insert(&self, _report: NewReport) -> Result<DistressReport> {
        anyhow::bail!("disk full")
    }
    async fn update_classification(
        &self,
        id: &str,
        _result: &ClassificationResult,
    ) -> Result<DistressReport> {
        anyhow::bail!("Report {id} not found")
    }
    async fn delete(&self, _id: &str) -> Result<Option<DistressReport>> {
        Ok(None)
    }
    async fn get(&self, _id: &str) -> Result<Option<DistressReport>> {
        Ok(None)
    }
    async fn query(&self, _filter: &ReportFilter) -> Result<Vec<DistressReport>> {
        Ok(Vec::new())
    }
    async fn status_counts(&self) -> Result<Vec<(VerificationStatus, u64)>> {
        Ok(Vec::new())
    }
    async fn oldest_pending(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }
    fn subscribe(&self) -> broadcast::Receiver<ReportEvent> {
        self.events.subscribe()
    }
}

// ============================================================
// Acknowledgment comes before classification
// ============================================================

#[tokio::test]
async fn submit_returns_pending_while_classifier_is_blocked() {
    let store = memory_store().unwrap();
    let classifier = Arc::new(GatedClassifier::new());
    let pipeline = SubmissionPipeline::new(store.clone(), classifier.clone());

    let submitted = pipeline.submit(flood_input()).await.unwrap();
    assert_eq!(submitted.report.classification, VerificationStatus::Pending);
    assert_eq!(submitted.report.confidence, 0.0);
    assert_eq!(submitted.report.rationale, PENDING_RATIONALE);

    // Stored as Pending too
    let stored = store.get(&submitted.report.id).await.unwrap().unwrap();
    assert!(stored.classification.is_pending());

    classifier.gate.notify_one();
    let classified = submitted.classification.await.unwrap().unwrap();
    assert_eq!(classified.classification, VerificationStatus::LikelyGenuine);
    assert_eq!(classified.rationale, "Released.");
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn submit_does_not_wait_for_slow_classifier() {
    let store = memory_store().unwrap();
    let delay = Duration::from_millis(600);
    let pipeline = SubmissionPipeline::new(store.clone(), Arc::new(SlowClassifier { delay }));

    let started = Instant::now();
    let submitted = pipeline.submit(flood_input()).await.unwrap();
    assert!(started.elapsed() < delay / 2);
    assert!(submitted.report.classification.is_pending());

    let classified = submitted.classification.await.unwrap().unwrap();
    assert!(started.elapsed() >= delay);
    assert_eq!(classified.classification, VerificationStatus::LikelyGenuine);
}

// ============================================================
// Background update
// ============================================================

#[tokio::test]
async fn classification_is_stored_and_broadcast() {
    let store = memory_store().unwrap();
    let mut events = store.subscribe();
    let pipeline = SubmissionPipeline::new(store.clone(), Arc::new(HeuristicClassifier::default()));

    let submitted = pipeline.submit(flood_input()).await.unwrap();
    let id = submitted.report.id.clone();
    submitted.classification.await.unwrap();

    let stored = store.get(&id).await.unwrap().unwrap();
    assert_eq!(stored.classification, VerificationStatus::LikelyGenuine);
    assert!((0.05..=0.98).contains(&stored.confidence));
    assert_eq!(stored.contact.as_deref(), Some("+919876543210"));
    assert!(stored.coordinates.is_some());

    let first = events.recv().await.unwrap();
    assert_eq!(first.kind, ChangeKind::Insert);
    assert_eq!(first.report.id, id);
    let second = events.recv().await.unwrap();
    assert_eq!(second.kind, ChangeKind::Update);
    assert_eq!(second.report, stored);
}

#[tokio::test]
async fn duplicate_classification_is_last_write_wins() {
    let store = memory_store().unwrap();
    let pipeline = SubmissionPipeline::new(store.clone(), Arc::new(HeuristicClassifier::default()));
    let submitted = pipeline.submit(flood_input()).await.unwrap();
    let report = submitted.report.clone();
    submitted.classification.await.unwrap();

    let second = ClassificationResult {
        status: Verdict::HighScamProbability,
        confidence: 0.2,
        reason: "Second opinion.".to_string(),
    };
    store.update_classification(&report.id, &second).await.unwrap();

    let stored = store.get(&report.id).await.unwrap().unwrap();
    assert_eq!(stored.classification, VerificationStatus::HighScamProbability);
    assert_eq!(stored.confidence, 0.2);
    assert_eq!(stored.rationale, "Second opinion.");

    // Running the background step again simply overwrites once more
    let again = classify_and_store(store.as_ref(), &HeuristicClassifier::default(), &report)
        .await
        .unwrap();
    assert_eq!(again.classification, VerificationStatus::LikelyGenuine);
    assert_eq!(store.query(&ReportFilter::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_update_is_swallowed() {
    let store = memory_store().unwrap();
    let classifier = Arc::new(GatedClassifier::new());
    let pipeline = SubmissionPipeline::new(store.clone(), classifier.clone());

    let submitted = pipeline.submit(flood_input()).await.unwrap();
    // Report disappears before the classifier finishes
    store.delete(&submitted.report.id).await.unwrap();
    classifier.gate.notify_one();

    assert!(submitted.classification.await.unwrap().is_none());
}

// ============================================================
// Rejections
// ============================================================

#[tokio::test]
async fn invalid_submission_stores_nothing() {
    let store = memory_store().unwrap();
    let classifier = Arc::new(GatedClassifier::new());
    let pipeline = SubmissionPipeline::new(store.clone(), classifier.clone());

    let input = SubmissionInput {
        message: "help".to_string(),
        location: "x".to_string(),
        ..Default::default()
    };
    match pipeline.submit(input).await {
        Err(SubmitError::Validation(errors)) => {
            assert_eq!(errors.fields(), vec!["message", "location"]);
        }
        Err(other) => panic!("expected validation error, got {other}"),
        Ok(_) => panic!("expected validation error"),
    }

    assert!(store.query(&ReportFilter::default()).await.unwrap().is_empty());
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn insert_failure_is_reported_and_nothing_is_classified() {
    let (events, _) = broadcast::channel(4);
    let classifier = Arc::new(GatedClassifier::new());
    let pipeline = SubmissionPipeline::new(Arc::new(BrokenStore { events }), classifier.clone());

    let err = pipeline.submit(flood_input()).await.err().unwrap();
    assert!(matches!(err, SubmitError::Persistence(_)));
    assert!(err.to_string().contains("disk full"));
    assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
}
