//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the FAQ Forge database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One job per seed URL, reused across triggers
CREATE TABLE IF NOT EXISTS jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    seed_url TEXT NOT NULL UNIQUE,
    domain TEXT NOT NULL,
    state TEXT NOT NULL,
    total_pages INTEGER NOT NULL DEFAULT 0,
    error_message TEXT,
    started_at TEXT,
    completed_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_jobs_state ON jobs(state);

-- One run per trigger, append-only history
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id INTEGER NOT NULL REFERENCES jobs(id),
    state TEXT NOT NULL,
    pages_discovered INTEGER NOT NULL DEFAULT 0,
    pages_crawled INTEGER NOT NULL DEFAULT 0,
    pages_failed INTEGER NOT NULL DEFAULT 0,
    faqs_generated INTEGER NOT NULL DEFAULT 0,
    progress INTEGER NOT NULL DEFAULT 0,
    started_at TEXT,
    completed_at TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_runs_job ON runs(job_id);

-- Ordered per-run error log
CREATE TABLE IF NOT EXISTS run_errors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    url TEXT NOT NULL,
    message TEXT NOT NULL,
    occurred_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_run_errors_run ON run_errors(run_id);

-- Extracted pages, unique per job
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id INTEGER NOT NULL REFERENCES jobs(id),
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    headings TEXT NOT NULL,
    paragraphs TEXT NOT NULL,
    extracted_text TEXT NOT NULL,
    word_count INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL,
    crawled_at TEXT NOT NULL,
    UNIQUE(job_id, url)
);

CREATE INDEX IF NOT EXISTS idx_pages_job ON pages(job_id);
CREATE INDEX IF NOT EXISTS idx_pages_status ON pages(status);

-- Generated question/answer pairs
CREATE TABLE IF NOT EXISTS faqs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id INTEGER NOT NULL REFERENCES jobs(id),
    page_id INTEGER NOT NULL REFERENCES pages(id),
    source_url TEXT NOT NULL,
    source_section TEXT,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    confidence REAL NOT NULL DEFAULT 0.8,
    published INTEGER NOT NULL DEFAULT 0,
    edited INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_faqs_job ON faqs(job_id);
CREATE INDEX IF NOT EXISTS idx_faqs_page ON faqs(page_id);
CREATE INDEX IF NOT EXISTS idx_faqs_published ON faqs(published);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
