// Dashboard aggregates.
//
// Status totals come from a grouped count in the store. Everything that
// needs individual rows (timeline, top locations, mean confidence) only
// looks at reports inside the timeline window, so the cost stays bounded
// as the table grows. `load` is shared by the CLI `stats` command and
// GET /api/stats.

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::db::models::{DistressReport, ReportFilter, VerificationStatus};
use crate::db::ReportStore;

/// Days covered by the timeline, today included.
pub const TIMELINE_DAYS: i64 = 7;
/// How many locations the top-locations list keeps.
pub const TOP_LOCATIONS: usize = 5;
/// Location labels are cut to this many characters before grouping.
const LOCATION_LABEL_CHARS: usize = 20;

/// Count of reports for one status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCount {
    pub status: VerificationStatus,
    pub count: u64,
}

/// One UTC day of the timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineDay {
    pub date: NaiveDate,
    pub total: u64,
    pub genuine: u64,
    pub scam: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationCount {
    pub name: String,
    pub count: u64,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total: u64,
    /// One entry per status, Pending included, zero-filled.
    pub by_status: Vec<StatusCount>,
    /// Mean confidence of classified reports in the timeline window; 0
    /// when none are classified.
    pub mean_confidence: f64,
    /// Percentage of all reports judged Likely Genuine.
    pub genuine_rate: f64,
    /// Percentage of all reports judged High Scam Probability.
    pub scam_rate: f64,
    /// Oldest day first.
    pub timeline: Vec<TimelineDay>,
    /// Busiest locations in the timeline window.
    pub top_locations: Vec<LocationCount>,
}

impl DashboardStats {
    pub fn count(&self, status: VerificationStatus) -> u64 {
        self.by_status
            .iter()
            .find(|c| c.status == status)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

/// First instant covered by the timeline: midnight UTC, `TIMELINE_DAYS - 1`
/// days before `now`.
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let first_day = now.date_naive() - Duration::days(TIMELINE_DAYS - 1);
    first_day.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Fetch what the dashboard needs from `store` and summarize it.
pub async fn load(store: &dyn ReportStore, now: DateTime<Utc>) -> Result<DashboardStats> {
    let counts = store.status_counts().await?;
    let recent = store
        .query(&ReportFilter {
            since: Some(window_start(now)),
            ..Default::default()
        })
        .await?;
    Ok(summarize(&counts, &recent, now))
}

/// Combine all-time status `counts` with the `recent` reports of the
/// timeline window, as seen at `now`.
pub fn summarize(
    counts: &[(VerificationStatus, u64)],
    recent: &[DistressReport],
    now: DateTime<Utc>,
) -> DashboardStats {
    let by_status: Vec<StatusCount> = VerificationStatus::ALL
        .iter()
        .map(|&status| StatusCount {
            status,
            count: counts
                .iter()
                .filter(|(s, _)| *s == status)
                .map(|(_, n)| n)
                .sum(),
        })
        .collect();
    let total: u64 = by_status.iter().map(|c| c.count).sum();

    let classified: Vec<f64> = recent
        .iter()
        .filter(|r| !r.classification.is_pending())
        .map(|r| r.confidence)
        .collect();
    let mean_confidence = if classified.is_empty() {
        0.0
    } else {
        classified.iter().sum::<f64>() / classified.len() as f64
    };

    let rate = |status: VerificationStatus| {
        if total == 0 {
            return 0.0;
        }
        let n = by_status
            .iter()
            .find(|c| c.status == status)
            .map_or(0, |c| c.count);
        n as f64 / total as f64 * 100.0
    };

    DashboardStats {
        genuine_rate: rate(VerificationStatus::LikelyGenuine),
        scam_rate: rate(VerificationStatus::HighScamProbability),
        total,
        by_status,
        mean_confidence,
        timeline: timeline(recent, now),
        top_locations: top_locations(recent),
    }
}

fn timeline(reports: &[DistressReport], now: DateTime<Utc>) -> Vec<TimelineDay> {
    let today = now.date_naive();
    (0..TIMELINE_DAYS)
        .rev()
        .map(|days_ago| {
            let date = today - Duration::days(days_ago);
            let day: Vec<&DistressReport> = reports
                .iter()
                .filter(|r| r.created_at.date_naive() == date)
                .collect();
            TimelineDay {
                date,
                total: day.len() as u64,
                genuine: day
                    .iter()
                    .filter(|r| r.classification == VerificationStatus::LikelyGenuine)
                    .count() as u64,
                scam: day
                    .iter()
                    .filter(|r| r.classification == VerificationStatus::HighScamProbability)
                    .count() as u64,
            }
        })
        .collect()
}

/// Group by the first comma-separated part of the location.
fn top_locations(reports: &[DistressReport]) -> Vec<LocationCount> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for report in reports {
        let head = report.location.split(',').next().unwrap_or("").trim();
        let label: String = head.chars().take(LOCATION_LABEL_CHARS).collect();
        *counts.entry(label).or_insert(0) += 1;
    }

    let mut locations: Vec<LocationCount> = counts
        .into_iter()
        .map(|(name, count)| LocationCount { name, count })
        .collect();
    // Ties broken by name so output is stable
    locations.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    locations.truncate(TOP_LOCATIONS);
    locations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn report(location: &str, status: VerificationStatus, confidence: f64, at: DateTime<Utc>) -> DistressReport {
        DistressReport {
            id: format!("{location}-{}", at.timestamp()),
            message: "Water rising near the school".to_string(),
            location: location.to_string(),
            contact: None,
            coordinates: None,
            submitted_by: None,
            created_at: at,
            classification: status,
            confidence,
            rationale: String::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 20, 15, 0, 0).unwrap()
    }

    fn counts_of(reports: &[DistressReport]) -> Vec<(VerificationStatus, u64)> {
        VerificationStatus::ALL
            .iter()
            .map(|&s| (s, reports.iter().filter(|r| r.classification == s).count() as u64))
            .collect()
    }

    fn summarize_all(reports: &[DistressReport], at: DateTime<Utc>) -> DashboardStats {
        summarize(&counts_of(reports), reports, at)
    }

    #[test]
    fn test_empty_input() {
        let stats = summarize(&[], &[], now());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.mean_confidence, 0.0);
        assert_eq!(stats.genuine_rate, 0.0);
        assert_eq!(stats.by_status.len(), 4);
        assert!(stats.by_status.iter().all(|c| c.count == 0));
        assert_eq!(stats.timeline.len(), 7);
        assert!(stats.top_locations.is_empty());
    }

    #[test]
    fn test_counts_and_mean_ignore_pending() {
        let t = now();
        let reports = vec![
            report("Patna, Bihar", VerificationStatus::LikelyGenuine, 0.9, t),
            report("Patna, Bihar", VerificationStatus::HighScamProbability, 0.1, t),
            report("Guwahati", VerificationStatus::Pending, 0.0, t),
            report("Guwahati", VerificationStatus::NeedsVerification, 0.5, t),
        ];
        let stats = summarize_all(&reports, t);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.count(VerificationStatus::Pending), 1);
        assert_eq!(stats.count(VerificationStatus::LikelyGenuine), 1);
        assert!((stats.mean_confidence - 0.5).abs() < 1e-9);
        assert!((stats.genuine_rate - 25.0).abs() < 1e-9);
        assert!((stats.scam_rate - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_totals_come_from_counts_not_window() {
        let t = now();
        let recent = vec![report("Patna", VerificationStatus::LikelyGenuine, 0.8, t)];
        let counts = vec![
            (VerificationStatus::LikelyGenuine, 30),
            (VerificationStatus::HighScamProbability, 10),
        ];
        let stats = summarize(&counts, &recent, t);
        assert_eq!(stats.total, 40);
        assert_eq!(stats.count(VerificationStatus::Pending), 0);
        assert!((stats.genuine_rate - 75.0).abs() < 1e-9);
        assert!((stats.scam_rate - 25.0).abs() < 1e-9);
        assert_eq!(stats.top_locations.len(), 1);
        assert_eq!(stats.timeline[6].total, 1);
    }

    #[test]
    fn test_window_starts_at_midnight_six_days_back() {
        assert_eq!(
            window_start(now()),
            Utc.with_ymd_and_hms(2025, 8, 14, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_timeline_buckets_by_utc_day() {
        let t = now();
        let reports = vec![
            report("A", VerificationStatus::LikelyGenuine, 0.8, t),
            report("B", VerificationStatus::HighScamProbability, 0.2, t - Duration::days(1)),
            report("C", VerificationStatus::LikelyGenuine, 0.8, t - Duration::days(6)),
            // Outside the window
            report("D", VerificationStatus::LikelyGenuine, 0.8, t - Duration::days(7)),
        ];
        let stats = summarize_all(&reports, t);
        let days = &stats.timeline;
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2025, 8, 14).unwrap());
        assert_eq!(days[6].date, NaiveDate::from_ymd_opt(2025, 8, 20).unwrap());
        assert_eq!((days[0].total, days[0].genuine), (1, 1));
        assert_eq!((days[5].total, days[5].scam), (1, 1));
        assert_eq!(days[6].total, 1);
        assert_eq!(days.iter().map(|d| d.total).sum::<u64>(), 3);
    }

    #[test]
    fn test_top_locations_group_on_first_segment() {
        let t = now();
        let reports = vec![
            report("Patna, Bihar", VerificationStatus::Pending, 0.0, t),
            report("Patna , Gandhi Maidan", VerificationStatus::Pending, 0.0, t),
            report("Guwahati", VerificationStatus::Pending, 0.0, t),
        ];
        let stats = summarize_all(&reports, t);
        assert_eq!(stats.top_locations[0], LocationCount { name: "Patna".to_string(), count: 2 });
        assert_eq!(stats.top_locations[1].name, "Guwahati");
    }

    #[tokio::test]
    async fn test_load_reads_counts_and_recent_window() {
        use crate::db::memory_store;
        use crate::db::models::NewReport;

        let store = memory_store().unwrap();
        for location in ["Patna, Bihar", "Patna, Danapur", "Guwahati"] {
            store
                .insert(NewReport {
                    message: "Water entering houses along the river bank".to_string(),
                    location: location.to_string(),
                    contact: None,
                    coordinates: None,
                    submitted_by: None,
                })
                .await
                .unwrap();
        }

        let stats = load(store.as_ref(), Utc::now()).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.count(VerificationStatus::Pending), 3);
        assert_eq!(stats.timeline.iter().map(|d| d.total).sum::<u64>(), 3);
        assert_eq!(stats.top_locations[0], LocationCount { name: "Patna".to_string(), count: 2 });
    }
}
