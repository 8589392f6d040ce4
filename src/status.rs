// System status display: DB stats, classifier backend, stuck reports.

use anyhow::Result;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

use crate::config::{ClassifierBackend, Config};
use crate::db::models::VerificationStatus;
use crate::db::ReportStore;
use crate::output::terminal::format_age;

/// Display system status to the terminal.
pub async fn show(store: &Arc<dyn ReportStore>, config: &Config) -> Result<()> {
    let db_path = config.db_path.as_str();
    if !Path::new(db_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `sahayak init` to set up the database.");
        return Ok(());
    }

    let file_size = std::fs::metadata(db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_path, file_size);

    match config.classifier_backend {
        ClassifierBackend::Heuristic => println!("Classifier: heuristic"),
        ClassifierBackend::Ai => {
            let key_state = if config.ai_api_key.is_empty() {
                "API key missing"
            } else {
                "API key set"
            };
            println!(
                "Classifier: ai ({}, {}), heuristic fallback",
                config.ai_model, key_state
            );
        }
    }

    let counts = store.status_counts().await?;
    let total: u64 = counts.iter().map(|(_, n)| n).sum();
    println!("Reports: {} total", total);
    for (status, count) in &counts {
        println!("  {:<22} {}", status.as_str(), count);
    }

    // Pending reports are never retried; a large or old backlog means
    // classification tasks died with the process.
    let pending = counts
        .iter()
        .find(|(s, _)| *s == VerificationStatus::Pending)
        .map(|(_, n)| *n)
        .unwrap_or(0);
    if pending > 0 {
        if let Some(oldest) = store.oldest_pending().await? {
            println!(
                "Oldest pending report: {} ago",
                format_age(oldest, Utc::now())
            );
        }
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
