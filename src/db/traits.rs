// Record store trait: backend-agnostic async interface for report storage.
//
// The submission pipeline, web handlers and CLI all take an
// `Arc<dyn ReportStore>`, so tests can swap in an in-memory SQLite store
// and nothing outside this module touches rusqlite.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use super::models::{DistressReport, NewReport, ReportEvent, ReportFilter, VerificationStatus};
use crate::verification::traits::ClassificationResult;

#[async_trait]
pub trait ReportStore: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Writes ---

    /// Insert a validated submission in the Pending state. The store assigns
    /// the id and creation timestamp.
    async fn insert(&self, report: NewReport) -> Result<DistressReport>;

    /// Record a classification. Fails if the id doesn't exist.
    async fn update_classification(
        &self,
        id: &str,
        result: &ClassificationResult,
    ) -> Result<DistressReport>;

    /// Remove a report (operator action). Returns the removed row, if any.
    async fn delete(&self, id: &str) -> Result<Option<DistressReport>>;

    // --- Reads ---

    async fn get(&self, id: &str) -> Result<Option<DistressReport>>;

    async fn query(&self, filter: &ReportFilter) -> Result<Vec<DistressReport>>;

    /// Report count per status, all four statuses present.
    async fn status_counts(&self) -> Result<Vec<(VerificationStatus, u64)>>;

    /// Creation time of the oldest report still Pending.
    async fn oldest_pending(&self) -> Result<Option<DateTime<Utc>>>;

    // --- Live changes ---

    /// Subscribe to inserts, updates and deletes made through this store.
    fn subscribe(&self) -> broadcast::Receiver<ReportEvent>;
}
