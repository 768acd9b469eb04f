//! Run status tracking
//!
//! The tracker owns a run's counters for the lifetime of a background task and
//! writes them back after every unit of work, so a poller reading the run record
//! only ever sees counters move forward.

use crate::state::{RunCounters, RunState};
use crate::storage::{with_storage, RunRecord, SharedStorage, Storage};
use crate::{ForgeError, Result};

/// Persists progress, errors and state transitions for one run
pub struct StatusTracker {
    storage: SharedStorage,
    run_id: i64,
    state: RunState,
    counters: RunCounters,
}

impl StatusTracker {
    /// Attaches a tracker to an existing run, loading its current state and counters
    ///
    /// # Arguments
    ///
    /// * `storage` - Shared storage handle
    /// * `run_id` - The run to track
    ///
    /// # Returns
    ///
    /// * `Ok(StatusTracker)` - Tracker positioned at the run's persisted state
    /// * `Err(ForgeError)` - The run does not exist or storage failed
    pub fn attach(storage: SharedStorage, run_id: i64) -> Result<Self> {
        let run = with_storage(&storage, |s| s.get_run(run_id))?
            .ok_or(ForgeError::NotFound { kind: "run", id: run_id })?;

        Ok(Self {
            storage,
            run_id,
            state: run.state,
            counters: run.counters,
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    /// Moves the run from queued to processing
    pub fn begin(&mut self) -> Result<()> {
        self.transition(RunState::Processing)
    }

    /// Records a successfully fetched and extracted page
    pub fn record_success(&mut self) -> Result<()> {
        self.counters.pages_discovered += 1;
        self.counters.pages_crawled += 1;
        self.persist_counters()
    }

    /// Records a page that failed to fetch or extract, appending to the error log
    pub fn record_failure(&mut self, url: &str, message: &str) -> Result<()> {
        self.counters.pages_discovered += 1;
        self.counters.pages_failed += 1;
        self.log_error(url, message)?;
        self.persist_counters()
    }

    /// Appends an entry to the run's error log without touching counters
    pub fn log_error(&mut self, url: &str, message: &str) -> Result<()> {
        let run_id = self.run_id;
        with_storage(&self.storage, |s| s.append_run_error(run_id, url, message))?;
        Ok(())
    }

    /// Moves the run to completed
    pub fn complete(&mut self) -> Result<()> {
        self.transition(RunState::Completed)
    }

    /// Moves the run to failed and logs the cause against `url`
    pub fn fail(&mut self, url: &str, message: &str) -> Result<()> {
        self.log_error(url, message)?;
        self.transition(RunState::Failed)
    }

    fn transition(&mut self, to: RunState) -> Result<()> {
        let next = self.state.transition(to)?;
        let run_id = self.run_id;
        with_storage(&self.storage, |s| s.update_run_state(run_id, next))?;
        tracing::debug!(run_id, from = %self.state, to = %next, "Run state changed");
        self.state = next;
        Ok(())
    }

    fn persist_counters(&mut self) -> Result<()> {
        let run_id = self.run_id;
        let counters = self.counters;
        with_storage(&self.storage, |s| s.update_run_counters(run_id, &counters))?;
        Ok(())
    }
}

/// Reads the most recently created run for a job, including its error log
pub fn latest_run(storage: &SharedStorage, job_id: i64) -> Result<Option<RunRecord>> {
    let run = with_storage(storage, |s| s.get_latest_run(job_id))?;
    Ok(run)
}

/// Adds `count` to the latest run's FAQ counter for a job, if the job has a run
pub fn add_faqs_to_latest_run(storage: &SharedStorage, job_id: i64, count: u32) -> Result<()> {
    if count == 0 {
        return Ok(());
    }

    let Some(run) = latest_run(storage, job_id)? else {
        return Ok(());
    };

    with_storage(storage, |s| s.add_run_faqs(run.id, count))?;
    tracing::debug!(job_id, run_id = run.id, count, "Added generated FAQs to run");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{shared, SqliteStorage};

    fn setup() -> (SharedStorage, i64, i64) {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let job = storage.upsert_job("https://a.test", "a.test").unwrap();
        let run = storage.create_run(job.id).unwrap();
        (shared(storage), job.id, run.id)
    }

    #[test]
    fn test_attach_missing_run() {
        let (storage, _, _) = setup();
        let result = StatusTracker::attach(storage, 999);
        assert!(matches!(
            result,
            Err(ForgeError::NotFound { kind: "run", id: 999 })
        ));
    }

    #[test]
    fn test_counters_persist_after_each_page() {
        let (storage, job_id, run_id) = setup();
        let mut tracker = StatusTracker::attach(storage.clone(), run_id).unwrap();
        tracker.begin().unwrap();

        tracker.record_success().unwrap();
        tracker.record_success().unwrap();
        tracker
            .record_failure("https://a.test/missing", "HTTP 404")
            .unwrap();

        let run = latest_run(&storage, job_id).unwrap().unwrap();
        assert_eq!(run.state, RunState::Processing);
        assert_eq!(run.counters, tracker.counters());
        assert_eq!(run.counters.pages_discovered, 3);
        assert_eq!(run.counters.pages_crawled, 2);
        assert_eq!(run.counters.pages_failed, 1);
        assert_eq!(run.progress, 67);
        assert_eq!(run.errors.len(), 1);
        assert_eq!(run.errors[0].url, "https://a.test/missing");
    }

    #[test]
    fn test_terminal_run_rejects_transitions() {
        let (storage, _, run_id) = setup();
        let mut tracker = StatusTracker::attach(storage, run_id).unwrap();
        tracker.begin().unwrap();
        tracker.complete().unwrap();

        assert!(matches!(
            tracker.begin(),
            Err(ForgeError::InvalidTransition { .. })
        ));
        assert!(tracker.fail("https://a.test", "late").is_err());
        assert_eq!(tracker.state(), RunState::Completed);
    }

    #[test]
    fn test_fail_logs_error() {
        let (storage, job_id, run_id) = setup();
        let mut tracker = StatusTracker::attach(storage.clone(), run_id).unwrap();
        tracker.begin().unwrap();
        tracker.fail("https://a.test", "domain parse failed").unwrap();

        let run = latest_run(&storage, job_id).unwrap().unwrap();
        assert_eq!(run.state, RunState::Failed);
        assert!(run.completed_at.is_some());
        assert_eq!(run.errors[0].message, "domain parse failed");
    }

    #[test]
    fn test_faq_counter_only_grows() {
        let (storage, job_id, _) = setup();

        add_faqs_to_latest_run(&storage, job_id, 4).unwrap();
        add_faqs_to_latest_run(&storage, job_id, 0).unwrap();
        add_faqs_to_latest_run(&storage, job_id, 2).unwrap();

        let run = latest_run(&storage, job_id).unwrap().unwrap();
        assert_eq!(run.counters.faqs_generated, 6);
    }

    #[test]
    fn test_faqs_without_run_is_noop() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let job = storage.upsert_job("https://b.test", "b.test").unwrap();
        let storage = shared(storage);

        assert!(add_faqs_to_latest_run(&storage, job.id, 3).is_ok());
        assert!(latest_run(&storage, job.id).unwrap().is_none());
    }
}
