// Submission pipeline: accept, store, then classify in the background.
//
// The caller gets the Pending record back as soon as the insert commits.
// Classification runs on a detached tokio task; nothing on the response
// path waits for it. If the classification update fails the report stays
// Pending and the failure is only logged.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::validation::{validate, SubmissionInput, ValidationErrors};
use crate::db::models::DistressReport;
use crate::db::ReportStore;
use crate::output::truncate_chars;
use crate::verification::traits::Classifier;

/// Why a submission was not accepted.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Input broke one or more rules. Nothing was stored.
    #[error("invalid submission: {0}")]
    Validation(ValidationErrors),
    /// The initial insert failed.
    #[error("failed to store report: {0:#}")]
    Persistence(anyhow::Error),
}

/// An accepted submission.
pub struct Submitted {
    /// The report as stored, still Pending.
    pub report: DistressReport,
    /// The background classification. Dropping the handle detaches the
    /// task; awaiting it yields the classified report, or None if the
    /// update could not be stored.
    pub classification: JoinHandle<Option<DistressReport>>,
}

/// Orchestrates validation, storage and classification.
#[derive(Clone)]
pub struct SubmissionPipeline {
    store: Arc<dyn ReportStore>,
    classifier: Arc<dyn Classifier>,
}

impl SubmissionPipeline {
    pub fn new(store: Arc<dyn ReportStore>, classifier: Arc<dyn Classifier>) -> Self {
        Self { store, classifier }
    }

    pub fn store(&self) -> &Arc<dyn ReportStore> {
        &self.store
    }

    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    /// Validate and store a submission, then start classifying it.
    pub async fn submit(&self, input: SubmissionInput) -> Result<Submitted, SubmitError> {
        let new_report = validate(input).map_err(SubmitError::Validation)?;

        let report = self
            .store
            .insert(new_report)
            .await
            .map_err(SubmitError::Persistence)?;

        info!(
            id = %report.id,
            location = %truncate_chars(&report.location, 40),
            message = %truncate_chars(&report.message, 50),
            "Report accepted"
        );

        let classification =
            spawn_classification(self.store.clone(), self.classifier.clone(), report.clone());

        Ok(Submitted {
            report,
            classification,
        })
    }
}

/// Run classification for a stored report on a detached task.
pub fn spawn_classification(
    store: Arc<dyn ReportStore>,
    classifier: Arc<dyn Classifier>,
    report: DistressReport,
) -> JoinHandle<Option<DistressReport>> {
    tokio::spawn(async move { classify_and_store(store.as_ref(), classifier.as_ref(), &report).await })
}

/// Classify a report and write the result back. Never panics or errors;
/// a failed write is logged and leaves the report Pending.
pub async fn classify_and_store(
    store: &dyn ReportStore,
    classifier: &dyn Classifier,
    report: &DistressReport,
) -> Option<DistressReport> {
    let result = classifier.classify(&report.message, &report.location).await;

    match store.update_classification(&report.id, &result).await {
        Ok(updated) => {
            info!(
                id = %report.id,
                backend = classifier.name(),
                status = %result.status,
                confidence = result.confidence,
                "Report classified"
            );
            Some(updated)
        }
        Err(e) => {
            error!(id = %report.id, error = %e, "Failed to store classification, report stays Pending");
            None
        }
    }
}
