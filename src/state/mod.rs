//! State module for tracking crawl and generation progress
//!
//! # Components
//!
//! - `JobState`: lifecycle of a seed URL's job (pending, crawling, completed, failed)
//! - `RunState`: lifecycle of one triggered attempt (queued, processing, completed, failed)
//! - `PageStatus`: outcome of a single page fetch
//! - `RunCounters`: progress counters persisted on a run
//! - `StatusTracker`: persists counters, error log and run transitions after each unit of work

mod job_state;
mod page_status;
mod run_state;
mod tracker;

// Re-export main types
pub use job_state::JobState;
pub use page_status::PageStatus;
pub use run_state::{RunCounters, RunState};
pub use tracker::{add_faqs_to_latest_run, latest_run, StatusTracker};
