//! Storage module for persisting scrape jobs
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Job creation and status transitions
//! - Record persistence, atomically with job completion

mod schema;
mod sqlite;
mod traits;

pub use schema::get_schema_version;
pub use sqlite::SqliteJobStore;
pub use traits::{JobStore, StorageError, StorageResult};

use crate::extract::RecordRow;
use crate::state::JobStatus;
use serde::Serialize;
use std::path::Path;

/// Initializes or opens a job store database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteJobStore)` - Successfully opened store
/// * `Err(StorageError)` - Failed to open or initialize the database
pub fn open_store(path: &Path) -> StorageResult<SqliteJobStore> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    SqliteJobStore::new(path)
}

/// Parameters of a job to be created
#[derive(Debug, Clone)]
pub struct NewJob {
    pub site: String,
    pub url: String,
    pub tx1: String,
    pub tx2: String,
}

/// A scrape job as stored
#[derive(Debug, Clone, Serialize)]
pub struct ParseJob {
    pub id: i64,
    pub site: String,
    pub url: String,
    pub tx1: String,
    pub tx2: String,
    #[serde(serialize_with = "serialize_status")]
    pub status: JobStatus,
    pub error: Option<String>,
    pub created_at: String,
    pub finished_at: Option<String>,
}

fn serialize_status<S: serde::Serializer>(status: &JobStatus, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(status.to_db_string())
}

/// A persisted record of one job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredRecord {
    pub id: i64,
    pub job_id: i64,
    #[serde(flatten)]
    pub row: RecordRow,
}
