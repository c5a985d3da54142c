//! Database schema definitions
//!
//! This module contains the SQL schema for the job store database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Scrape jobs
CREATE TABLE IF NOT EXISTS parse_jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site TEXT NOT NULL,
    url TEXT NOT NULL,
    tx1 TEXT NOT NULL DEFAULT '',
    tx2 TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL,
    error TEXT,
    created_at TEXT NOT NULL,
    finished_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_parse_jobs_status ON parse_jobs(status);

-- One row per extracted item; unresolved fields hold the 'unknown' sentinel
CREATE TABLE IF NOT EXISTS parse_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id INTEGER NOT NULL REFERENCES parse_jobs(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    article TEXT NOT NULL,
    name TEXT NOT NULL,
    price TEXT NOT NULL,
    stock TEXT NOT NULL,
    tx1 TEXT NOT NULL,
    tx2 TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_parse_records_job ON parse_records(job_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - SQLite connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Gets the current schema version
pub fn get_schema_version() -> u32 {
    1
}
