//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::state::{JobState, PageStatus, RunCounters, RunState};
use crate::storage::{
    FaqFilter, FaqRecord, FaqUpdate, JobRecord, NewFaq, NewPage, PageRecord, RunErrorEntry,
    RunRecord,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Job not found: {0}")]
    JobNotFound(i64),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Treated as a plain record store: create, find, update, delete. Lifecycle
/// rules (which transitions are legal, when counters move) live in the
/// callers, not here.
pub trait Storage {
    // ===== Job Management =====

    /// Creates a job for `seed_url`, or resets the existing one
    ///
    /// Either way the job comes back `pending` with its error message and
    /// completion timestamp cleared. Re-triggering a seed never duplicates it.
    fn upsert_job(&mut self, seed_url: &str, domain: &str) -> StorageResult<JobRecord>;

    /// Gets a job by ID
    fn get_job(&self, job_id: i64) -> StorageResult<Option<JobRecord>>;

    /// Gets a job by its seed URL
    fn get_job_by_seed(&self, seed_url: &str) -> StorageResult<Option<JobRecord>>;

    /// Lists all jobs, newest first
    fn list_jobs(&self) -> StorageResult<Vec<JobRecord>>;

    /// Writes a job state; entering `crawling` stamps `started_at`
    fn update_job_state(&mut self, job_id: i64, state: JobState) -> StorageResult<()>;

    /// Marks a job completed with its successful page count
    fn complete_job(&mut self, job_id: i64, total_pages: u32) -> StorageResult<()>;

    /// Marks a job failed with the captured message
    fn fail_job(&mut self, job_id: i64, message: &str) -> StorageResult<()>;

    // ===== Run Management =====

    /// Creates a fresh `queued` run for a job
    fn create_run(&mut self, job_id: i64) -> StorageResult<RunRecord>;

    /// Gets a run by ID, including its error log
    fn get_run(&self, run_id: i64) -> StorageResult<Option<RunRecord>>;

    /// Gets the most recently created run for a job
    fn get_latest_run(&self, job_id: i64) -> StorageResult<Option<RunRecord>>;

    /// Writes a run state; `processing` stamps `started_at`, terminal states stamp `completed_at`
    fn update_run_state(&mut self, run_id: i64, state: RunState) -> StorageResult<()>;

    /// Writes the page counters and the derived progress
    ///
    /// `faqs_generated` is left alone; it only changes through `add_run_faqs`.
    fn update_run_counters(&mut self, run_id: i64, counters: &RunCounters) -> StorageResult<()>;

    /// Atomically adds `count` to a run's FAQ counter
    fn add_run_faqs(&mut self, run_id: i64, count: u32) -> StorageResult<()>;

    /// Appends an entry to the run's error log
    fn append_run_error(&mut self, run_id: i64, url: &str, message: &str) -> StorageResult<()>;

    /// Gets a run's error log in insertion order
    fn get_run_errors(&self, run_id: i64) -> StorageResult<Vec<RunErrorEntry>>;

    // ===== Page Management =====

    /// Inserts a page or gets the ID of the one already stored for `(job_id, url)`
    fn insert_or_get_page(&mut self, page: &NewPage) -> StorageResult<i64>;

    /// Gets a page by ID
    fn get_page(&self, page_id: i64) -> StorageResult<Option<PageRecord>>;

    /// Gets a job's pages, optionally filtered by status, newest first
    fn get_pages_for_job(
        &self,
        job_id: i64,
        status: Option<PageStatus>,
    ) -> StorageResult<Vec<PageRecord>>;

    /// Gets the most recently crawled pages across all jobs
    fn list_recent_pages(&self, limit: u32) -> StorageResult<Vec<PageRecord>>;

    /// Counts a job's pages with the given status
    fn count_pages_for_job(&self, job_id: i64, status: PageStatus) -> StorageResult<u64>;

    // ===== FAQ Management =====

    /// Inserts a FAQ, unpublished and unedited
    fn insert_faq(&mut self, faq: &NewFaq) -> StorageResult<i64>;

    /// Gets a FAQ by ID
    fn get_faq(&self, faq_id: i64) -> StorageResult<Option<FaqRecord>>;

    /// Counts the FAQs stored for a page
    fn count_faqs_for_page(&self, page_id: i64) -> StorageResult<u64>;

    /// Lists FAQs matching the filter, newest first
    fn list_faqs(&self, filter: &FaqFilter) -> StorageResult<Vec<FaqRecord>>;

    /// Applies a partial update; any text change sets `edited`
    ///
    /// Returns the updated record, or `None` if no FAQ has that ID.
    fn update_faq(&mut self, faq_id: i64, update: &FaqUpdate) -> StorageResult<Option<FaqRecord>>;

    /// Deletes a FAQ, returning whether it existed
    fn delete_faq(&mut self, faq_id: i64) -> StorageResult<bool>;
}
