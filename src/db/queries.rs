// SQL for distress reports. Plain functions over a borrowed Connection;
// SqliteReportStore wraps them with locking and change events.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::models::{
    Coordinates, DistressReport, ReportFilter, SortOrder, VerificationStatus,
};
use crate::verification::traits::ClassificationResult;

const REPORT_COLUMNS: &str = "id, message, location, contact, latitude, longitude, submitted_by,
                              created_at, classification, confidence, rationale";

/// Format a timestamp the way it's stored. Fixed width, so text order is
/// chronological order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn row_to_report(row: &Row<'_>) -> rusqlite::Result<DistressReport> {
    let created_raw: String = row.get(7)?;
    let created_at = DateTime::parse_from_rfc3339(&created_raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    let latitude: Option<f64> = row.get(4)?;
    let longitude: Option<f64> = row.get(5)?;
    let coordinates = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        _ => None,
    };

    let classification: String = row.get(8)?;
    let confidence: f64 = row.get(9)?;

    Ok(DistressReport {
        id: row.get(0)?,
        message: row.get(1)?,
        location: row.get(2)?,
        contact: row.get(3)?,
        coordinates,
        submitted_by: row.get(6)?,
        created_at,
        classification: VerificationStatus::from_label(&classification),
        confidence: if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.5
        },
        rationale: row.get(10)?,
    })
}

/// Insert a new report row.
pub fn insert_report(conn: &Connection, report: &DistressReport) -> Result<()> {
    conn.execute(
        "INSERT INTO distress_reports
            (id, message, location, contact, latitude, longitude, submitted_by,
             created_at, classification, confidence, rationale)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            report.id,
            report.message,
            report.location,
            report.contact,
            report.coordinates.map(|c| c.latitude),
            report.coordinates.map(|c| c.longitude),
            report.submitted_by,
            format_timestamp(&report.created_at),
            report.classification.as_str(),
            report.confidence,
            report.rationale,
        ],
    )?;
    Ok(())
}

/// Write a classification onto an existing report and return the updated row.
///
/// Fails if the id doesn't exist. A second call for the same id simply
/// overwrites the first (last write wins).
pub fn update_classification(
    conn: &Connection,
    id: &str,
    result: &ClassificationResult,
) -> Result<DistressReport> {
    let status: VerificationStatus = result.status.into();
    let changed = conn.execute(
        "UPDATE distress_reports
         SET classification = ?2, confidence = ?3, rationale = ?4
         WHERE id = ?1",
        params![
            id,
            status.as_str(),
            result.confidence.clamp(0.0, 1.0),
            result.reason,
        ],
    )?;

    if changed == 0 {
        anyhow::bail!("Report {id} not found");
    }

    get_report(conn, id)?.ok_or_else(|| anyhow::anyhow!("Report {id} vanished after update"))
}

/// Load one report by id.
pub fn get_report(conn: &Connection, id: &str) -> Result<Option<DistressReport>> {
    let sql = format!("SELECT {REPORT_COLUMNS} FROM distress_reports WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![id], row_to_report).optional()?;
    Ok(result)
}

/// List reports matching a filter.
pub fn query_reports(conn: &Connection, filter: &ReportFilter) -> Result<Vec<DistressReport>> {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(status) = filter.status {
        values.push(Box::new(status.as_str()));
        clauses.push(format!("classification = ?{}", values.len()));
    }

    if let Some(since) = filter.since {
        values.push(Box::new(format_timestamp(&since)));
        clauses.push(format!("created_at >= ?{}", values.len()));
    }

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        values.push(Box::new(format!("%{}%", escape_like(search))));
        let n = values.len();
        clauses.push(format!(
            "(message LIKE ?{n} ESCAPE '\\' OR location LIKE ?{n} ESCAPE '\\')"
        ));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let order_sql = match filter.order {
        SortOrder::NewestFirst => "ORDER BY created_at DESC, id DESC",
        SortOrder::OldestFirst => "ORDER BY created_at ASC, id ASC",
    };

    // SQLite treats a negative LIMIT as "no limit"
    values.push(Box::new(filter.limit.map(i64::from).unwrap_or(-1)));
    let limit_idx = values.len();
    values.push(Box::new(i64::from(filter.offset)));
    let offset_idx = values.len();

    let sql = format!(
        "SELECT {REPORT_COLUMNS} FROM distress_reports {where_sql} {order_sql}
         LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values.iter()), row_to_report)?;

    let mut reports = Vec::new();
    for row in rows {
        reports.push(row?);
    }
    Ok(reports)
}

/// Escape LIKE wildcards so user search text matches literally.
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Delete a report, returning the removed row if it existed.
pub fn delete_report(conn: &Connection, id: &str) -> Result<Option<DistressReport>> {
    let existing = get_report(conn, id)?;
    if existing.is_some() {
        conn.execute("DELETE FROM distress_reports WHERE id = ?1", params![id])?;
    }
    Ok(existing)
}

/// Number of reports in each status. Statuses with no reports are included
/// with a zero count.
pub fn status_counts(conn: &Connection) -> Result<Vec<(VerificationStatus, u64)>> {
    let mut stmt = conn.prepare(
        "SELECT classification, COUNT(*) FROM distress_reports GROUP BY classification",
    )?;
    let rows = stmt.query_map([], |row| {
        let label: String = row.get(0)?;
        let count: i64 = row.get(1)?;
        Ok((VerificationStatus::from_label(&label), count.max(0) as u64))
    })?;

    let mut counts: Vec<(VerificationStatus, u64)> =
        VerificationStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for row in rows {
        let (status, count) = row?;
        if let Some(entry) = counts.iter_mut().find(|(s, _)| *s == status) {
            entry.1 += count;
        }
    }
    Ok(counts)
}

/// Creation time of the oldest report still waiting for a classification.
pub fn oldest_pending(conn: &Connection) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT MIN(created_at) FROM distress_reports WHERE classification = 'Pending'",
            [],
            |row| row.get(0),
        )
        .optional()?
        .flatten();

    match raw {
        Some(raw) => Ok(Some(DateTime::parse_from_rfc3339(&raw)?.with_timezone(&Utc))),
        None => Ok(None),
    }
}
