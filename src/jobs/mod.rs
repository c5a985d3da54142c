//! Job execution
//!
//! A `JobRunner` takes a pending job from the store, resolves its site adapter,
//! runs the extraction on its own task and finalizes the job. Whatever goes wrong
//! inside the adapter, including a panic, ends up as the job's error message.

use crate::sites::{ExtractRequest, Extraction, ParserRegistry};
use crate::state::JobStatus;
use crate::storage::{JobStore, NewJob, ParseJob, StorageResult, StoredRecord};
use crate::{HarvestError, Result};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use url::Url;

/// Error message of a job that finished without a single record
pub const NO_RESULTS: &str = "no results — blocked or no matching items";

/// Store handle shared between the runner and its spawned jobs
pub type SharedStore = Arc<Mutex<dyn JobStore + Send>>;

/// Runs scrape jobs against the registered site adapters
#[derive(Clone)]
pub struct JobRunner {
    registry: Arc<ParserRegistry>,
    store: SharedStore,
}

impl JobRunner {
    pub fn new(registry: Arc<ParserRegistry>, store: SharedStore) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Creates a pending job
    ///
    /// # Returns
    ///
    /// The new job's ID
    pub fn submit_job(&self, site: &str, url: &str, tx1: &str, tx2: &str) -> Result<i64> {
        let job = NewJob {
            site: site.trim().to_string(),
            url: url.trim().to_string(),
            tx1: tx1.trim().to_string(),
            tx2: tx2.trim().to_string(),
        };
        let id = self.with_store(|store| store.create_job(&job))?;
        tracing::info!("Job {} submitted for {} ({})", id, job.site, job.url);
        Ok(id)
    }

    pub fn job(&self, job_id: i64) -> Result<ParseJob> {
        self.with_store(|store| store.get_job(job_id))?
            .ok_or(HarvestError::JobNotFound(job_id))
    }

    pub fn records(&self, job_id: i64) -> Result<Vec<StoredRecord>> {
        self.job(job_id)?;
        self.with_store(|store| store.list_records(job_id))
    }

    /// Runs a pending job to completion
    ///
    /// Extraction failures are not returned: they are persisted as the job's error
    /// and reported through the final status.
    ///
    /// # Returns
    ///
    /// * `Ok(JobStatus)` - The job's final status, `Done` or `Error`
    /// * `Err(HarvestError)` - The job does not exist, is not pending, or the store failed
    pub async fn run_job(&self, job_id: i64) -> Result<JobStatus> {
        let job = self.job(job_id)?;
        self.with_store(|store| store.set_status(job_id, JobStatus::Running, None))?;
        tracing::info!("Job {} running: {} {}", job_id, job.site, job.url);

        match self.execute(&job).await {
            Ok(extraction) if !extraction.records.is_empty() => {
                let count = extraction.records.len();
                if let Err(e) = self.with_store(|store| store.complete_job(job_id, &extraction.records)) {
                    return self.fail(job_id, &e.to_string());
                }
                if !extraction.diagnostics.is_empty() {
                    tracing::warn!("Job {}: {}", job_id, extraction.diagnostics);
                }
                tracing::info!("Job {} done with {} records", job_id, count);
                Ok(JobStatus::Done)
            }
            Ok(_) => self.fail(job_id, NO_RESULTS),
            Err(e) => self.fail(job_id, &e.to_string()),
        }
    }

    /// Runs a job on its own task
    pub fn spawn(&self, job_id: i64) -> JoinHandle<Result<JobStatus>> {
        let runner = self.clone();
        tokio::spawn(async move { runner.run_job(job_id).await })
    }

    async fn execute(&self, job: &ParseJob) -> Result<Extraction> {
        let adapter = self.registry.resolve(&job.site)?;
        let request = ExtractRequest {
            entry_url: Url::parse(&job.url)?,
            tx1: job.tx1.clone(),
            tx2: job.tx2.clone(),
        };

        let task = tokio::spawn(async move { adapter.extract(&request).await });
        task.await
            .map_err(|e| HarvestError::TaskPanicked(e.to_string()))?
    }

    fn fail(&self, job_id: i64, message: &str) -> Result<JobStatus> {
        tracing::error!("Job {} failed: {}", job_id, message);
        self.with_store(|store| store.set_status(job_id, JobStatus::Error, Some(message)))?;
        Ok(JobStatus::Error)
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut dyn JobStore) -> StorageResult<T>) -> Result<T> {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&mut *store)?)
    }
}
