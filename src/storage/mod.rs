//! Storage module for persisting jobs, runs, pages and FAQs
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Job and run lifecycle persistence
//! - Append-only run error logs
//! - Extracted page records
//! - Generated FAQ records and their edits

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::crawler::Heading;
use crate::state::{JobState, PageStatus, RunCounters, RunState};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Storage handle shared between the trigger path and background tasks
///
/// The lock is only ever held for the duration of a synchronous storage call,
/// never across an `.await`.
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Wraps a storage backend for sharing across tasks
pub fn shared(storage: SqliteStorage) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Runs `f` with exclusive access to the shared storage
pub fn with_storage<T, F>(storage: &SharedStorage, f: F) -> StorageResult<T>
where
    F: FnOnce(&mut SqliteStorage) -> StorageResult<T>,
{
    let mut guard = storage.lock().map_err(|_| StorageError::LockPoisoned)?;
    f(&mut guard)
}

/// Represents a job in the database
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: i64,
    pub seed_url: String,
    pub domain: String,
    pub state: JobState,
    pub total_pages: u32,
    pub error_message: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
}

/// One entry of a run's append-only error log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunErrorEntry {
    pub url: String,
    pub message: String,
    pub timestamp: String,
}

/// Represents a run (one triggered attempt) in the database
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub id: i64,
    pub job_id: i64,
    pub state: RunState,
    #[serde(flatten)]
    pub counters: RunCounters,
    pub progress: u8,
    pub errors: Vec<RunErrorEntry>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
}

/// Represents an extracted page in the database
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    pub id: i64,
    pub job_id: i64,
    pub url: String,
    pub title: String,
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    pub text: String,
    pub word_count: u32,
    pub status: PageStatus,
    pub crawled_at: String,
}

/// A page about to be stored
#[derive(Debug, Clone)]
pub struct NewPage {
    pub job_id: i64,
    pub url: String,
    pub title: String,
    pub headings: Vec<Heading>,
    pub paragraphs: Vec<String>,
    pub text: String,
    pub word_count: u32,
    pub status: PageStatus,
}

/// Represents a generated FAQ in the database
#[derive(Debug, Clone, Serialize)]
pub struct FaqRecord {
    pub id: i64,
    pub job_id: i64,
    pub page_id: i64,
    pub source_url: String,
    pub source_section: Option<String>,
    pub question: String,
    pub answer: String,
    pub confidence: f64,
    pub published: bool,
    pub edited: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A FAQ about to be stored
#[derive(Debug, Clone)]
pub struct NewFaq {
    pub job_id: i64,
    pub page_id: i64,
    pub source_url: String,
    pub source_section: Option<String>,
    pub question: String,
    pub answer: String,
    pub confidence: f64,
}

/// Filters for listing and exporting FAQs
#[derive(Debug, Clone, Copy, Default)]
pub struct FaqFilter {
    pub job_id: Option<i64>,
    pub published: Option<bool>,
}

/// Partial mutation of a FAQ; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct FaqUpdate {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub published: Option<bool>,
}

impl FaqUpdate {
    /// Returns true if the update touches question or answer text
    pub fn changes_text(&self) -> bool {
        self.question.is_some() || self.answer.is_some()
    }

    /// Returns true if the update changes nothing
    pub fn is_empty(&self) -> bool {
        !self.changes_text() && self.published.is_none()
    }
}
