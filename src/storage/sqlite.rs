//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::{JobState, PageStatus, RunCounters, RunState};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    FaqFilter, FaqRecord, FaqUpdate, JobRecord, NewFaq, NewPage, PageRecord, RunErrorEntry,
    RunRecord,
};
use chrono::{SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const JOB_COLUMNS: &str = "id, seed_url, domain, state, total_pages, error_message, \
                           started_at, completed_at, created_at";

const RUN_COLUMNS: &str = "id, job_id, state, pages_discovered, pages_crawled, pages_failed, \
                           faqs_generated, progress, started_at, completed_at, created_at";

const PAGE_COLUMNS: &str = "id, job_id, url, title, headings, paragraphs, extracted_text, \
                            word_count, status, crawled_at";

const FAQ_COLUMNS: &str = "id, job_id, page_id, source_url, source_section, question, answer, \
                           confidence, published, edited, created_at, updated_at";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
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

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Current time in a fixed-width RFC 3339 form so text ordering matches time ordering
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn job_from_row(row: &Row) -> rusqlite::Result<JobRecord> {
    Ok(JobRecord {
        id: row.get(0)?,
        seed_url: row.get(1)?,
        domain: row.get(2)?,
        state: JobState::from_db_string(&row.get::<_, String>(3)?).unwrap_or(JobState::Failed),
        total_pages: row.get(4)?,
        error_message: row.get(5)?,
        started_at: row.get(6)?,
        completed_at: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn run_from_row(row: &Row) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        job_id: row.get(1)?,
        state: RunState::from_db_string(&row.get::<_, String>(2)?).unwrap_or(RunState::Failed),
        counters: RunCounters {
            pages_discovered: row.get(3)?,
            pages_crawled: row.get(4)?,
            pages_failed: row.get(5)?,
            faqs_generated: row.get(6)?,
        },
        progress: row.get(7)?,
        errors: Vec::new(),
        started_at: row.get(8)?,
        completed_at: row.get(9)?,
        created_at: row.get(10)?,
    })
}

fn page_from_row(row: &Row) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        id: row.get(0)?,
        job_id: row.get(1)?,
        url: row.get(2)?,
        title: row.get(3)?,
        headings: json_column(row, 4)?,
        paragraphs: json_column(row, 5)?,
        text: row.get(6)?,
        word_count: row.get(7)?,
        status: PageStatus::from_db_string(&row.get::<_, String>(8)?)
            .unwrap_or(PageStatus::Failed),
        crawled_at: row.get(9)?,
    })
}

fn faq_from_row(row: &Row) -> rusqlite::Result<FaqRecord> {
    Ok(FaqRecord {
        id: row.get(0)?,
        job_id: row.get(1)?,
        page_id: row.get(2)?,
        source_url: row.get(3)?,
        source_section: row.get(4)?,
        question: row.get(5)?,
        answer: row.get(6)?,
        confidence: row.get(7)?,
        published: row.get(8)?,
        edited: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

impl SqliteStorage {
    fn with_errors(&self, run: Option<RunRecord>) -> StorageResult<Option<RunRecord>> {
        match run {
            Some(mut run) => {
                run.errors = self.get_run_errors(run.id)?;
                Ok(Some(run))
            }
            None => Ok(None),
        }
    }
}

impl Storage for SqliteStorage {
    // ===== Job Management =====

    fn upsert_job(&mut self, seed_url: &str, domain: &str) -> StorageResult<JobRecord> {
        let now = now();

        let job_id = match self.get_job_by_seed(seed_url)?.map(|job| job.id) {
            Some(id) => {
                self.conn.execute(
                    "UPDATE jobs SET state = ?1, domain = ?2, error_message = NULL,
                     completed_at = NULL, updated_at = ?3 WHERE id = ?4",
                    params![JobState::Pending.to_db_string(), domain, now, id],
                )?;
                id
            }
            None => {
                self.conn.execute(
                    "INSERT INTO jobs (seed_url, domain, state, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?4)",
                    params![seed_url, domain, JobState::Pending.to_db_string(), now],
                )?;
                self.conn.last_insert_rowid()
            }
        };

        self.get_job(job_id)?
            .ok_or(StorageError::JobNotFound(job_id))
    }

    fn get_job(&self, job_id: i64) -> StorageResult<Option<JobRecord>> {
        let job = self
            .conn
            .query_row(
                &format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS),
                params![job_id],
                job_from_row,
            )
            .optional()?;
        Ok(job)
    }

    fn get_job_by_seed(&self, seed_url: &str) -> StorageResult<Option<JobRecord>> {
        let job = self
            .conn
            .query_row(
                &format!("SELECT {} FROM jobs WHERE seed_url = ?1", JOB_COLUMNS),
                params![seed_url],
                job_from_row,
            )
            .optional()?;
        Ok(job)
    }

    fn list_jobs(&self) -> StorageResult<Vec<JobRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM jobs ORDER BY created_at DESC, id DESC",
            JOB_COLUMNS
        ))?;

        let jobs = stmt
            .query_map([], job_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(jobs)
    }

    fn update_job_state(&mut self, job_id: i64, state: JobState) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE jobs SET state = ?1, updated_at = ?2,
             started_at = CASE WHEN ?1 = 'crawling' THEN ?2 ELSE started_at END
             WHERE id = ?3",
            params![state.to_db_string(), now(), job_id],
        )?;

        if updated == 0 {
            return Err(StorageError::JobNotFound(job_id));
        }
        Ok(())
    }

    fn complete_job(&mut self, job_id: i64, total_pages: u32) -> StorageResult<()> {
        let now = now();
        let updated = self.conn.execute(
            "UPDATE jobs SET state = ?1, total_pages = ?2, completed_at = ?3, updated_at = ?3
             WHERE id = ?4",
            params![JobState::Completed.to_db_string(), total_pages, now, job_id],
        )?;

        if updated == 0 {
            return Err(StorageError::JobNotFound(job_id));
        }
        Ok(())
    }

    fn fail_job(&mut self, job_id: i64, message: &str) -> StorageResult<()> {
        let now = now();
        let updated = self.conn.execute(
            "UPDATE jobs SET state = ?1, error_message = ?2, completed_at = ?3, updated_at = ?3
             WHERE id = ?4",
            params![JobState::Failed.to_db_string(), message, now, job_id],
        )?;

        if updated == 0 {
            return Err(StorageError::JobNotFound(job_id));
        }
        Ok(())
    }

    // ===== Run Management =====

    fn create_run(&mut self, job_id: i64) -> StorageResult<RunRecord> {
        self.conn.execute(
            "INSERT INTO runs (job_id, state, created_at) VALUES (?1, ?2, ?3)",
            params![job_id, RunState::Queued.to_db_string(), now()],
        )?;

        let run_id = self.conn.last_insert_rowid();
        self.get_run(run_id)?.ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_run(&self, run_id: i64) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?;

        self.with_errors(run)
    }

    fn get_latest_run(&self, job_id: i64) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM runs WHERE job_id = ?1 ORDER BY id DESC LIMIT 1",
                    RUN_COLUMNS
                ),
                params![job_id],
                run_from_row,
            )
            .optional()?;

        self.with_errors(run)
    }

    fn update_run_state(&mut self, run_id: i64, state: RunState) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET state = ?1,
             started_at = CASE WHEN ?1 = 'processing' THEN ?2 ELSE started_at END,
             completed_at = CASE WHEN ?1 IN ('completed', 'failed') THEN ?2 ELSE completed_at END
             WHERE id = ?3",
            params![state.to_db_string(), now(), run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn update_run_counters(&mut self, run_id: i64, counters: &RunCounters) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET pages_discovered = ?1, pages_crawled = ?2, pages_failed = ?3,
             progress = ?4 WHERE id = ?5",
            params![
                counters.pages_discovered,
                counters.pages_crawled,
                counters.pages_failed,
                counters.progress(),
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn add_run_faqs(&mut self, run_id: i64, count: u32) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE runs SET faqs_generated = faqs_generated + ?1 WHERE id = ?2",
            params![count, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn append_run_error(&mut self, run_id: i64, url: &str, message: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO run_errors (run_id, url, message, occurred_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, url, message, now()],
        )?;
        Ok(())
    }

    fn get_run_errors(&self, run_id: i64) -> StorageResult<Vec<RunErrorEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, message, occurred_at FROM run_errors WHERE run_id = ?1 ORDER BY id ASC",
        )?;

        let errors = stmt
            .query_map(params![run_id], |row| {
                Ok(RunErrorEntry {
                    url: row.get(0)?,
                    message: row.get(1)?,
                    timestamp: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(errors)
    }

    // ===== Page Management =====

    fn insert_or_get_page(&mut self, page: &NewPage) -> StorageResult<i64> {
        let existing: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM pages WHERE job_id = ?1 AND url = ?2",
                params![page.job_id, page.url],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        let headings = serde_json::to_string(&page.headings)?;
        let paragraphs = serde_json::to_string(&page.paragraphs)?;

        self.conn.execute(
            "INSERT INTO pages (job_id, url, title, headings, paragraphs, extracted_text,
             word_count, status, crawled_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                page.job_id,
                page.url,
                page.title,
                headings,
                paragraphs,
                page.text,
                page.word_count,
                page.status.to_db_string(),
                now()
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_page(&self, page_id: i64) -> StorageResult<Option<PageRecord>> {
        let page = self
            .conn
            .query_row(
                &format!("SELECT {} FROM pages WHERE id = ?1", PAGE_COLUMNS),
                params![page_id],
                page_from_row,
            )
            .optional()?;
        Ok(page)
    }

    fn get_pages_for_job(
        &self,
        job_id: i64,
        status: Option<PageStatus>,
    ) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pages WHERE job_id = ?1 AND (?2 IS NULL OR status = ?2)
             ORDER BY crawled_at DESC, id DESC",
            PAGE_COLUMNS
        ))?;

        let pages = stmt
            .query_map(
                params![job_id, status.map(|s| s.to_db_string())],
                page_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    fn list_recent_pages(&self, limit: u32) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pages ORDER BY crawled_at DESC, id DESC LIMIT ?1",
            PAGE_COLUMNS
        ))?;

        let pages = stmt
            .query_map(params![limit], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pages)
    }

    fn count_pages_for_job(&self, job_id: i64, status: PageStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE job_id = ?1 AND status = ?2",
            params![job_id, status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== FAQ Management =====

    fn insert_faq(&mut self, faq: &NewFaq) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO faqs (job_id, page_id, source_url, source_section, question, answer,
             confidence, published, edited, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, 0, ?8, ?8)",
            params![
                faq.job_id,
                faq.page_id,
                faq.source_url,
                faq.source_section,
                faq.question.trim(),
                faq.answer.trim(),
                faq.confidence,
                now()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_faq(&self, faq_id: i64) -> StorageResult<Option<FaqRecord>> {
        let faq = self
            .conn
            .query_row(
                &format!("SELECT {} FROM faqs WHERE id = ?1", FAQ_COLUMNS),
                params![faq_id],
                faq_from_row,
            )
            .optional()?;
        Ok(faq)
    }

    fn count_faqs_for_page(&self, page_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM faqs WHERE page_id = ?1",
            params![page_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn list_faqs(&self, filter: &FaqFilter) -> StorageResult<Vec<FaqRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM faqs
             WHERE (?1 IS NULL OR job_id = ?1) AND (?2 IS NULL OR published = ?2)
             ORDER BY created_at DESC, id DESC",
            FAQ_COLUMNS
        ))?;

        let faqs = stmt
            .query_map(params![filter.job_id, filter.published], faq_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(faqs)
    }

    fn update_faq(&mut self, faq_id: i64, update: &FaqUpdate) -> StorageResult<Option<FaqRecord>> {
        let Some(mut faq) = self.get_faq(faq_id)? else {
            return Ok(None);
        };

        if let Some(question) = &update.question {
            faq.question = question.trim().to_string();
            faq.edited = true;
        }
        if let Some(answer) = &update.answer {
            faq.answer = answer.trim().to_string();
            faq.edited = true;
        }
        if let Some(published) = update.published {
            faq.published = published;
        }

        self.conn.execute(
            "UPDATE faqs SET question = ?1, answer = ?2, published = ?3, edited = ?4,
             updated_at = ?5 WHERE id = ?6",
            params![
                faq.question,
                faq.answer,
                faq.published,
                faq.edited,
                now(),
                faq_id
            ],
        )?;

        self.get_faq(faq_id)
    }

    fn delete_faq(&mut self, faq_id: i64) -> StorageResult<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM faqs WHERE id = ?1", params![faq_id])?;
        Ok(deleted > 0)
    }
}
