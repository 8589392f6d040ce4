// Data models: Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite directly.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::verification::traits::Verdict;

/// Rationale stored on every freshly inserted report.
pub const PENDING_RATIONALE: &str = "Analyzing...";

/// Classification state of a report.
///
/// `Pending` is the only initial state; the other three are terminal and
/// are only ever reached through a [`Verdict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationStatus {
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Likely Genuine")]
    LikelyGenuine,
    #[serde(rename = "Needs Verification")]
    NeedsVerification,
    #[serde(rename = "High Scam Probability")]
    HighScamProbability,
}

impl VerificationStatus {
    pub const ALL: [VerificationStatus; 4] = [
        VerificationStatus::Pending,
        VerificationStatus::LikelyGenuine,
        VerificationStatus::NeedsVerification,
        VerificationStatus::HighScamProbability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "Pending",
            VerificationStatus::LikelyGenuine => "Likely Genuine",
            VerificationStatus::NeedsVerification => "Needs Verification",
            VerificationStatus::HighScamProbability => "High Scam Probability",
        }
    }

    /// Parse a stored or user-supplied label.
    ///
    /// Unknown labels resolve to `NeedsVerification` so that an unreadable
    /// state always lands in front of a human, never in the genuine bucket.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Pending" => VerificationStatus::Pending,
            "Likely Genuine" => VerificationStatus::LikelyGenuine,
            "High Scam Probability" => VerificationStatus::HighScamProbability,
            _ => VerificationStatus::NeedsVerification,
        }
    }

    /// Parse a query-string filter value. Accepts labels and short aliases
    /// (`genuine`, `verify`, `scam`, `pending`), case-insensitively.
    pub fn from_filter(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "pending" => Some(VerificationStatus::Pending),
            "genuine" | "likely genuine" => Some(VerificationStatus::LikelyGenuine),
            "verify" | "needs verification" => Some(VerificationStatus::NeedsVerification),
            "scam" | "high scam probability" => Some(VerificationStatus::HighScamProbability),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, VerificationStatus::Pending)
    }
}

impl From<Verdict> for VerificationStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::LikelyGenuine => VerificationStatus::LikelyGenuine,
            Verdict::NeedsVerification => VerificationStatus::NeedsVerification,
            Verdict::HighScamProbability => VerificationStatus::HighScamProbability,
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A GPS fix attached to a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A stored distress report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistressReport {
    pub id: String,
    pub message: String,
    pub location: String,
    pub contact: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub submitted_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub classification: VerificationStatus,
    pub confidence: f64,
    pub rationale: String,
}

impl DistressReport {
    /// Build the initial Pending record for a validated submission.
    pub fn pending(id: String, new: NewReport, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            message: new.message,
            location: new.location,
            contact: new.contact,
            coordinates: new.coordinates,
            submitted_by: new.submitted_by,
            created_at,
            classification: VerificationStatus::Pending,
            confidence: 0.0,
            rationale: PENDING_RATIONALE.to_string(),
        }
    }
}

/// A validated submission, ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub message: String,
    pub location: String,
    pub contact: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub submitted_by: Option<String>,
}

/// Kind of change pushed to live subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        }
    }
}

/// A change notification. For deletes, `report` is the removed row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEvent {
    pub kind: ChangeKind,
    pub report: DistressReport,
}

/// Result ordering for report queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Filters for listing reports. All fields are optional and combine with AND.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub status: Option<VerificationStatus>,
    /// Only reports created at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Case-insensitive substring match on message or location.
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
    pub order: SortOrder,
}

/// Start of the trailing `hours` window ending at `now`. `None` when the
/// window reaches past the earliest representable timestamp.
pub fn hours_before(now: DateTime<Utc>, hours: u32) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(Duration::try_hours(i64::from(hours))?)
}
