// Table layout for the report store.
//
// The base tables are created with IF NOT EXISTS; later column changes live
// in MIGRATIONS and are recorded in `schema_version` once applied.

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

const BASE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER PRIMARY KEY,
        applied_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS distress_reports (
        id TEXT PRIMARY KEY,                    -- UUID v4
        message TEXT NOT NULL,
        location TEXT NOT NULL,
        contact TEXT,
        latitude REAL,                          -- both set or both null
        longitude REAL,
        created_at TEXT NOT NULL,               -- RFC 3339, UTC, millisecond precision
        classification TEXT NOT NULL DEFAULT 'Pending',
        confidence REAL NOT NULL DEFAULT 0,
        rationale TEXT NOT NULL DEFAULT 'Analyzing...'
    );

    CREATE INDEX IF NOT EXISTS idx_reports_created
        ON distress_reports(created_at);
    CREATE INDEX IF NOT EXISTS idx_reports_classification
        ON distress_reports(classification);
";

/// Version 1 is the base layout. Each entry after it runs exactly once.
const MIGRATIONS: &[(i64, &str)] = &[
    // Reports filed by a signed-in user; anonymous ones stay null.
    (2, "ALTER TABLE distress_reports ADD COLUMN submitted_by TEXT;"),
];

/// Bring a connection up to the current layout. Safe on every open.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(BASE_TABLES)
        .context("Failed to create report tables")?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (1)",
        [],
    )?;

    for &(version, sql) in MIGRATIONS {
        if applied(conn, version)? {
            continue;
        }
        conn.execute_batch(sql)
            .with_context(|| format!("Schema upgrade to v{version} failed"))?;
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            params![version],
        )?;
    }
    Ok(())
}

fn applied(conn: &Connection, version: i64) -> Result<bool> {
    let found = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM schema_version WHERE version = ?1)",
        params![version],
        |row| row.get(0),
    )?;
    Ok(found)
}

/// Number of user tables, printed by `sahayak init`.
pub fn table_count(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )
    .context("Failed to count tables")
}
