// Report storage. SQLite through rusqlite (bundled build), one file at
// SAHAYAK_DB_PATH, default ./sahayak.db.

pub mod models;
pub mod queries;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod watch;

pub use sqlite::SqliteReportStore;
pub use traits::ReportStore;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::Connection;

fn connect(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {db_path}"))?;
    // WAL lets `feed --follow` read while `serve` writes
    conn.pragma_update(None, "journal_mode", "WAL")?;
    schema::create_tables(&conn)?;
    Ok(conn)
}

/// Create the database file (and its directory) if missing, then open it.
/// Used by `sahayak init` and `sahayak serve`.
pub fn initialize(db_path: &str) -> Result<Connection> {
    let dir = Path::new(db_path).parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    connect(db_path)
}

/// Open a database that `sahayak init` already created. Pending schema
/// upgrades are applied on the way in.
pub fn open(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        anyhow::bail!("No database at {db_path}. Run `sahayak init` first.");
    }
    connect(db_path)
}

pub fn initialize_store(db_path: &str) -> Result<Arc<dyn ReportStore>> {
    Ok(Arc::new(SqliteReportStore::new(initialize(db_path)?)))
}

pub fn open_store(db_path: &str) -> Result<Arc<dyn ReportStore>> {
    Ok(Arc::new(SqliteReportStore::new(open(db_path)?)))
}

/// Throwaway store for tests.
pub fn memory_store() -> Result<Arc<dyn ReportStore>> {
    let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
    schema::create_tables(&conn)?;
    Ok(Arc::new(SqliteReportStore::new(conn)))
}
