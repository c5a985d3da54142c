//! Job store trait and error types
//!
//! This module defines the trait interface for job store backends and
//! associated error types.

use crate::extract::ExtractedRecord;
use crate::state::JobStatus;
use crate::storage::{NewJob, ParseJob, StoredRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Job not found: {0}")]
    JobNotFound(i64),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence for scrape jobs and their records
///
/// The store owns job status. Every status change goes through `set_status` or
/// `complete_job`, both of which reject transitions that are not forward moves.
pub trait JobStore {
    // ===== Job Management =====

    /// Creates a pending job
    ///
    /// # Returns
    ///
    /// The ID of the newly created job
    fn create_job(&mut self, job: &NewJob) -> StorageResult<i64>;

    /// Gets a job by ID, or None if it does not exist
    fn get_job(&self, job_id: i64) -> StorageResult<Option<ParseJob>>;

    /// Lists every job, newest first
    fn list_jobs(&self) -> StorageResult<Vec<ParseJob>>;

    /// Moves a job to `status`, recording `error` alongside it
    ///
    /// # Errors
    ///
    /// * `JobNotFound` - no job with this ID
    /// * `InvalidTransition` - the move is not pending → running or running → done | error
    fn set_status(
        &mut self,
        job_id: i64,
        status: JobStatus,
        error: Option<&str>,
    ) -> StorageResult<()>;

    // ===== Records =====

    /// Stores one record for a job
    fn create_record(&mut self, job_id: i64, record: &ExtractedRecord) -> StorageResult<i64>;

    /// Stores all records and marks the job done in one transaction
    ///
    /// Nothing is written if the job is not running.
    fn complete_job(&mut self, job_id: i64, records: &[ExtractedRecord]) -> StorageResult<()>;

    /// Lists a job's records in insertion order
    fn list_records(&self, job_id: i64) -> StorageResult<Vec<StoredRecord>>;
}
