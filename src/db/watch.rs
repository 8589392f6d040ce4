// Polling change detection for processes that don't share the store.
//
// The broadcast channel in SqliteReportStore only reaches subscribers in
// the same process. A CLI watching a database that a separate server
// writes to has to compare successive query results instead.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use super::models::{ChangeKind, DistressReport, ReportEvent, ReportFilter};
use super::traits::ReportStore;

pub struct ReportWatcher {
    store: Arc<dyn ReportStore>,
    filter: ReportFilter,
    known: HashMap<String, DistressReport>,
}

impl ReportWatcher {
    /// Start watching. Reports already matching `filter` are treated as
    /// seen and produce no events.
    pub async fn start(store: Arc<dyn ReportStore>, filter: ReportFilter) -> Result<Self> {
        let current = store.query(&filter).await?;
        let known = current.into_iter().map(|r| (r.id.clone(), r)).collect();
        Ok(Self {
            store,
            filter,
            known,
        })
    }

    /// Changes since the previous poll. A report that left the result
    /// window is only reported as deleted if it is really gone.
    pub async fn poll(&mut self) -> Result<Vec<ReportEvent>> {
        let current = self.store.query(&self.filter).await?;
        let mut events = Vec::new();
        let mut next: HashMap<String, DistressReport> = HashMap::with_capacity(current.len());

        // Oldest first so a feed prints in arrival order
        for report in current.into_iter().rev() {
            match self.known.get(&report.id) {
                None => events.push(ReportEvent {
                    kind: ChangeKind::Insert,
                    report: report.clone(),
                }),
                Some(previous) if previous != &report => events.push(ReportEvent {
                    kind: ChangeKind::Update,
                    report: report.clone(),
                }),
                Some(_) => {}
            }
            next.insert(report.id.clone(), report);
        }

        for (id, report) in self.known.drain() {
            if !next.contains_key(&id) && self.store.get(&id).await?.is_none() {
                events.push(ReportEvent {
                    kind: ChangeKind::Delete,
                    report,
                });
            }
        }

        self.known = next;
        Ok(events)
    }
}
