// SqliteReportStore: rusqlite backend implementing the ReportStore trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Send.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// Change events are published only after the write succeeded, so a
// subscriber never sees an update before the insert it belongs to.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tokio::sync::{broadcast, Mutex};
use tracing::debug;
use uuid::Uuid;

use super::models::{
    ChangeKind, DistressReport, NewReport, ReportEvent, ReportFilter, VerificationStatus,
};
use super::traits::ReportStore;
use crate::verification::traits::ClassificationResult;

/// How many change events a slow subscriber may fall behind before it
/// starts missing them.
const EVENT_BUFFER: usize = 256;

pub struct SqliteReportStore {
    conn: Mutex<Connection>,
    events: broadcast::Sender<ReportEvent>,
}

impl SqliteReportStore {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            conn: Mutex::new(conn),
            events,
        }
    }

    fn publish(&self, kind: ChangeKind, report: &DistressReport) {
        // Err only means nobody is listening right now
        let _ = self.events.send(ReportEvent {
            kind,
            report: report.clone(),
        });
    }
}

#[async_trait]
impl ReportStore for SqliteReportStore {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn insert(&self, report: NewReport) -> Result<DistressReport> {
        // Stored timestamps carry millisecond precision; match that here so
        // the returned record equals what a later read produces.
        let created_at =
            DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap_or_else(Utc::now);
        let report = DistressReport::pending(Uuid::new_v4().to_string(), report, created_at);
        {
            let conn = self.conn.lock().await;
            super::queries::insert_report(&conn, &report)?;
        }
        debug!(id = %report.id, "Report inserted");
        self.publish(ChangeKind::Insert, &report);
        Ok(report)
    }

    async fn update_classification(
        &self,
        id: &str,
        result: &ClassificationResult,
    ) -> Result<DistressReport> {
        let updated = {
            let conn = self.conn.lock().await;
            super::queries::update_classification(&conn, id, result)?
        };
        self.publish(ChangeKind::Update, &updated);
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<Option<DistressReport>> {
        let removed = {
            let conn = self.conn.lock().await;
            super::queries::delete_report(&conn, id)?
        };
        if let Some(ref report) = removed {
            self.publish(ChangeKind::Delete, report);
        }
        Ok(removed)
    }

    async fn get(&self, id: &str) -> Result<Option<DistressReport>> {
        let conn = self.conn.lock().await;
        super::queries::get_report(&conn, id)
    }

    async fn query(&self, filter: &ReportFilter) -> Result<Vec<DistressReport>> {
        let conn = self.conn.lock().await;
        super::queries::query_reports(&conn, filter)
    }

    async fn status_counts(&self) -> Result<Vec<(VerificationStatus, u64)>> {
        let conn = self.conn.lock().await;
        super::queries::status_counts(&conn)
    }

    async fn oldest_pending(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn.lock().await;
        super::queries::oldest_pending(&conn)
    }

    fn subscribe(&self) -> broadcast::Receiver<ReportEvent> {
        self.events.subscribe()
    }
}
