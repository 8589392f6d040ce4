// Colored terminal output for reports, verdicts and dashboard stats.
//
// This module handles all terminal-specific formatting. The main.rs
// command functions delegate here.

use chrono::{DateTime, Utc};
use colored::Colorize;

use crate::analytics::DashboardStats;
use crate::db::models::{ChangeKind, DistressReport, ReportEvent, VerificationStatus};
use crate::verification::traits::ClassificationResult;

/// Display a list of reports, one line each.
pub fn display_report_list(reports: &[DistressReport]) {
    if reports.is_empty() {
        println!("No reports match. Submit one with `sahayak submit`.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Distress Feed ({} reports) ===", reports.len()).bold()
    );
    println!();

    println!(
        "  {:<8}  {:<16}  {:<22}  {:>5}  {:<24}  {}",
        "ID".dimmed(),
        "Submitted".dimmed(),
        "Status".dimmed(),
        "Conf".dimmed(),
        "Location".dimmed(),
        "Message".dimmed(),
    );
    println!("  {}", "-".repeat(110).dimmed());

    for report in reports {
        println!(
            "  {:<8}  {:<16}  {:<22}  {:>5}  {:<24}  {}",
            short_id(&report.id),
            report.created_at.format("%Y-%m-%d %H:%M"),
            colorize_status(report.classification),
            format_confidence(report),
            super::truncate_chars(&report.location, 21),
            super::truncate_chars(&report.message, 48).dimmed(),
        );
    }

    println!();

    let scam = reports
        .iter()
        .filter(|r| r.classification == VerificationStatus::HighScamProbability)
        .count();
    let pending = reports.iter().filter(|r| r.classification.is_pending()).count();
    if scam > 0 {
        println!("  {} {} flagged as likely scams", "!!".red().bold(), scam);
    }
    if pending > 0 {
        println!("  {} {} still being analyzed", "~".cyan(), pending);
    }
}

/// Display one report in full.
pub fn display_report_detail(report: &DistressReport) {
    println!("\n{}", format!("=== Report {} ===", report.id).bold());
    println!("  Status:     {}", colorize_status(report.classification));
    println!("  Confidence: {}", format_confidence(report));
    println!("  Rationale:  {}", report.rationale);
    println!();
    println!("  Location:   {}", report.location);
    if let Some(coords) = report.coordinates {
        println!(
            "  GPS:        {:.5}, {:.5}",
            coords.latitude, coords.longitude
        );
    }
    if let Some(ref contact) = report.contact {
        println!("  Contact:    {}", contact);
    }
    if let Some(ref user) = report.submitted_by {
        println!("  Submitted by: {}", user);
    }
    println!("  Submitted:  {}", report.created_at.to_rfc3339());
    println!("\n  {}", report.message);
}

/// Display a verdict that was not stored, e.g. from `sahayak classify`.
pub fn display_classification(result: &ClassificationResult, backend: &str) {
    let status: VerificationStatus = result.status.into();
    println!(
        "\n{} {} ({:.0}% confidence, {} classifier)",
        "Verdict:".bold(),
        colorize_status(status),
        result.confidence * 100.0,
        backend
    );
    println!("  {}", result.reason.dimmed());
}

/// Display one live change from `sahayak feed --follow`.
pub fn display_event(event: &ReportEvent) {
    let report = &event.report;
    let kind = match event.kind {
        ChangeKind::Insert => "NEW".cyan().bold(),
        ChangeKind::Update => "UPD".normal(),
        ChangeKind::Delete => "DEL".red(),
    };
    println!(
        "  {} {:<8}  {:<22}  {:>5}  {}",
        kind,
        short_id(&report.id),
        colorize_status(report.classification),
        format_confidence(report),
        super::truncate_chars(&report.message, 60).dimmed(),
    );
}

/// Display dashboard aggregates.
pub fn display_stats(stats: &DashboardStats) {
    println!(
        "\n{}",
        format!("=== Dashboard ({} reports) ===", stats.total).bold()
    );
    println!();

    for entry in &stats.by_status {
        println!(
            "  {:<22} {:>6}",
            colorize_status(entry.status),
            entry.count
        );
    }
    println!(
        "\n  Genuine rate: {:.1}%   Scam rate: {:.1}%   Avg confidence: {:.0}%",
        stats.genuine_rate,
        stats.scam_rate,
        stats.mean_confidence * 100.0
    );

    println!("\n  {}", "Last 7 days".bold());
    let peak = stats.timeline.iter().map(|d| d.total).max().unwrap_or(0);
    for day in &stats.timeline {
        let bar_len = if peak == 0 {
            0
        } else {
            (day.total * 30).div_ceil(peak) as usize
        };
        println!(
            "  {}  {:>4}  {:<30}  {} genuine, {} scam",
            day.date.format("%a %d %b"),
            day.total,
            "#".repeat(bar_len).cyan(),
            day.genuine,
            day.scam
        );
    }

    if !stats.top_locations.is_empty() {
        println!("\n  {}", "Top locations".bold());
        for loc in &stats.top_locations {
            println!("  {:<22} {:>4}", loc.name, loc.count);
        }
    }
    println!();
}

/// Human-readable age, e.g. "3m" or "2h 5m".
pub fn format_age(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - since).num_seconds().max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86_400, (secs % 86_400) / 3600)
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn format_confidence(report: &DistressReport) -> String {
    if report.classification.is_pending() {
        "-".to_string()
    } else {
        format!("{:.0}%", report.confidence * 100.0)
    }
}

/// Colorize a verification status label.
fn colorize_status(status: VerificationStatus) -> colored::ColoredString {
    let label = status.as_str();
    match status {
        VerificationStatus::LikelyGenuine => label.green(),
        VerificationStatus::NeedsVerification => label.yellow(),
        VerificationStatus::HighScamProbability => label.red().bold(),
        VerificationStatus::Pending => label.dimmed(),
    }
}
