//! SQLite job store implementation

use crate::extract::{ExtractedRecord, RecordRow};
use crate::state::JobStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{JobStore, StorageError, StorageResult};
use crate::storage::{NewJob, ParseJob, StoredRecord};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const JOB_COLUMNS: &str = "id, site, url, tx1, tx2, status, error, created_at, finished_at";

/// SQLite job store backend
pub struct SqliteJobStore {
    conn: Connection,
}

impl SqliteJobStore {
    /// Opens or creates a job store at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteJobStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory store
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn current_status(conn: &Connection, job_id: i64) -> StorageResult<JobStatus> {
        let status: Option<String> = conn
            .query_row(
                "SELECT status FROM parse_jobs WHERE id = ?1",
                params![job_id],
                |row| row.get(0),
            )
            .optional()?;

        let status = status.ok_or(StorageError::JobNotFound(job_id))?;
        JobStatus::from_db_string(&status)
            .ok_or_else(|| StorageError::Database(format!("unknown job status '{}'", status)))
    }

    fn check_transition(from: JobStatus, to: JobStatus) -> StorageResult<()> {
        if from.can_transition_to(to) {
            Ok(())
        } else {
            Err(StorageError::InvalidTransition { from, to })
        }
    }
}

fn insert_record(conn: &Connection, job_id: i64, record: &ExtractedRecord) -> StorageResult<i64> {
    let row = record.to_row();
    conn.execute(
        "INSERT INTO parse_records (job_id, url, article, name, price, stock, tx1, tx2)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![job_id, row.url, row.article, row.name, row.price, row.stock, row.tx1, row.tx2],
    )?;
    Ok(conn.last_insert_rowid())
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<ParseJob> {
    Ok(ParseJob {
        id: row.get(0)?,
        site: row.get(1)?,
        url: row.get(2)?,
        tx1: row.get(3)?,
        tx2: row.get(4)?,
        status: JobStatus::from_db_string(&row.get::<_, String>(5)?).unwrap_or(JobStatus::Error),
        error: row.get(6)?,
        created_at: row.get(7)?,
        finished_at: row.get(8)?,
    })
}

impl JobStore for SqliteJobStore {
    // ===== Job Management =====

    fn create_job(&mut self, job: &NewJob) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO parse_jobs (site, url, tx1, tx2, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                job.site,
                job.url,
                job.tx1,
                job.tx2,
                JobStatus::Pending.to_db_string(),
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_job(&self, job_id: i64) -> StorageResult<Option<ParseJob>> {
        let sql = format!("SELECT {} FROM parse_jobs WHERE id = ?1", JOB_COLUMNS);
        let job = self
            .conn
            .query_row(&sql, params![job_id], job_from_row)
            .optional()?;
        Ok(job)
    }

    fn list_jobs(&self) -> StorageResult<Vec<ParseJob>> {
        let sql = format!("SELECT {} FROM parse_jobs ORDER BY id DESC", JOB_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let jobs = stmt
            .query_map([], job_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(jobs)
    }

    fn set_status(
        &mut self,
        job_id: i64,
        status: JobStatus,
        error: Option<&str>,
    ) -> StorageResult<()> {
        let current = Self::current_status(&self.conn, job_id)?;
        Self::check_transition(current, status)?;

        let finished_at = status.is_terminal().then(|| Utc::now().to_rfc3339());
        self.conn.execute(
            "UPDATE parse_jobs SET status = ?1, error = ?2, finished_at = ?3 WHERE id = ?4",
            params![status.to_db_string(), error, finished_at, job_id],
        )?;
        tracing::debug!("Job {}: {} -> {}", job_id, current, status);
        Ok(())
    }

    // ===== Records =====

    fn create_record(&mut self, job_id: i64, record: &ExtractedRecord) -> StorageResult<i64> {
        Self::current_status(&self.conn, job_id)?;
        insert_record(&self.conn, job_id, record)
    }

    fn complete_job(&mut self, job_id: i64, records: &[ExtractedRecord]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        let current = Self::current_status(&tx, job_id)?;
        Self::check_transition(current, JobStatus::Done)?;

        for record in records {
            insert_record(&tx, job_id, record)?;
        }

        tx.execute(
            "UPDATE parse_jobs SET status = ?1, error = NULL, finished_at = ?2 WHERE id = ?3",
            params![JobStatus::Done.to_db_string(), Utc::now().to_rfc3339(), job_id],
        )?;
        tx.commit()?;

        tracing::debug!("Job {}: stored {} records", job_id, records.len());
        Ok(())
    }

    fn list_records(&self, job_id: i64) -> StorageResult<Vec<StoredRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, job_id, url, article, name, price, stock, tx1, tx2
             FROM parse_records WHERE job_id = ?1 ORDER BY id",
        )?;

        let records = stmt
            .query_map(params![job_id], |row| {
                Ok(StoredRecord {
                    id: row.get(0)?,
                    job_id: row.get(1)?,
                    row: RecordRow {
                        url: row.get(2)?,
                        article: row.get(3)?,
                        name: row.get(4)?,
                        price: row.get(5)?,
                        stock: row.get(6)?,
                        tx1: row.get(7)?,
                        tx2: row.get(8)?,
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}
