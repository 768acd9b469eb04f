//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the BFS loop that drives one crawl run:
//! - Moving the job and run into their active states
//! - Pulling entries from the run's frontier under depth and page caps
//! - Fetching serially with a politeness delay between attempts
//! - Extracting and persisting page content, queueing discovered links
//! - Recording per-URL failures without aborting the run
//! - Marking the job and run completed, or failed on an escaping error

use crate::config::Config;
use crate::crawler::extractor::{extract_content, extract_links};
use crate::crawler::fetcher::{build_http_client, fetch_page};
use crate::crawler::frontier::CrawlContext;
use crate::state::{JobState, PageStatus, RunState, StatusTracker};
use crate::storage::{with_storage, NewPage, SharedStorage, Storage};
use crate::url::normalize_url;
use crate::{ForgeError, Result};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Final tallies of a finished crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    pub job_id: i64,
    pub run_id: i64,
    pub pages_crawled: u32,
    pub pages_failed: u32,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    storage: SharedStorage,
    client: Client,
    tracker: StatusTracker,
    job_id: i64,
    seed_url: String,
}

impl Coordinator {
    /// Creates a coordinator for an already-created job and run
    ///
    /// # Arguments
    ///
    /// * `config` - Crawl limits and client signature
    /// * `storage` - Shared storage holding the job and run
    /// * `job_id` - The job being crawled
    /// * `run_id` - The queued run this crawl reports to
    /// * `seed_url` - Starting URL of the crawl
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(ForgeError)` - The HTTP client could not be built or the run is missing
    pub fn new(
        config: Arc<Config>,
        storage: SharedStorage,
        job_id: i64,
        run_id: i64,
        seed_url: impl Into<String>,
    ) -> Result<Self> {
        let client = build_http_client(&config.crawler, &config.user_agent)?;
        let tracker = StatusTracker::attach(storage.clone(), run_id)?;

        Ok(Self {
            config,
            storage,
            client,
            tracker,
            job_id,
            seed_url: seed_url.into(),
        })
    }

    /// Runs the crawl to a terminal state
    ///
    /// Per-URL failures are recorded and skipped. Any other error fails both
    /// the run and the job with the error message and is returned.
    pub async fn run(mut self) -> Result<CrawlSummary> {
        match self.crawl().await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                let message = e.to_string();
                tracing::error!(
                    job_id = self.job_id,
                    run_id = self.tracker.run_id(),
                    url = %self.seed_url,
                    "Crawl failed: {}",
                    message
                );

                if !self.tracker.state().is_terminal() {
                    if let Err(track_err) = self.tracker.fail(&self.seed_url, &message) {
                        tracing::error!("Failed to record run failure: {}", track_err);
                    }
                }
                if let Err(job_err) = fail_job(&self.storage, self.job_id, &message) {
                    tracing::error!("Failed to record job failure: {}", job_err);
                }

                Err(e)
            }
        }
    }

    async fn crawl(&mut self) -> Result<CrawlSummary> {
        let run_id = self.tracker.run_id();

        self.transition_job(JobState::Crawling)?;
        self.tracker.begin()?;

        tracing::info!(job_id = self.job_id, run_id, url = %self.seed_url, "Starting crawl");

        let mut ctx = CrawlContext::new(self.job_id, run_id, &self.seed_url)?;
        let max_depth = self.config.crawler.max_depth;
        let max_pages = self.config.crawler.max_pages;
        let delay = Duration::from_millis(self.config.crawler.politeness_delay_ms);
        let mut fetched_any = false;

        while ctx.results() < max_pages {
            let Some(entry) = ctx.frontier.pop() else {
                tracing::debug!(job_id = self.job_id, "Frontier is empty");
                break;
            };

            if entry.depth > max_depth {
                tracing::debug!(url = %entry.url, depth = entry.depth, "Skipping URL beyond max depth");
                continue;
            }

            let Some(normalized) = normalize_url(&entry.url) else {
                tracing::debug!(url = %entry.url, "Skipping unparseable URL");
                continue;
            };

            if !ctx.frontier.mark_visited(&normalized) {
                continue;
            }

            if fetched_any && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            fetched_any = true;

            tracing::debug!(job_id = self.job_id, url = %normalized, depth = entry.depth, "Processing URL");

            match self.crawl_page(&ctx, &entry.url, &normalized).await {
                Ok(links) => {
                    ctx.pages_succeeded += 1;
                    self.tracker.record_success()?;

                    if entry.depth < max_depth {
                        for link in links {
                            ctx.frontier.push(link, entry.depth + 1);
                        }
                    }
                }
                Err(message) => {
                    ctx.pages_failed += 1;
                    tracing::warn!(job_id = self.job_id, url = %entry.url, "{}", message);
                    self.tracker.record_failure(&entry.url, &message)?;
                }
            }
        }

        self.tracker.complete()?;
        let job_id = self.job_id;
        let total = ctx.pages_succeeded;
        with_storage(&self.storage, |s| s.complete_job(job_id, total))?;

        tracing::info!(
            job_id,
            run_id,
            pages_crawled = ctx.pages_succeeded,
            pages_failed = ctx.pages_failed,
            "Crawl completed"
        );

        Ok(CrawlSummary {
            job_id,
            run_id,
            pages_crawled: ctx.pages_succeeded,
            pages_failed: ctx.pages_failed,
        })
    }

    /// Fetches, extracts and stores one page
    ///
    /// Returns the page's new same-domain links, or a message describing why
    /// this URL failed.
    async fn crawl_page(
        &self,
        ctx: &CrawlContext,
        url: &str,
        normalized: &str,
    ) -> std::result::Result<Vec<String>, String> {
        let html = fetch_page(&self.client, url)
            .await
            .map_err(|e| e.to_string())?;

        let content = extract_content(&html, normalized);
        let links = extract_links(&html, url, &ctx.domain, ctx.frontier.visited());

        let page = NewPage {
            job_id: ctx.job_id,
            url: normalized.to_string(),
            title: content.title,
            headings: content.headings,
            paragraphs: content.paragraphs,
            text: content.text,
            word_count: content.word_count,
            status: PageStatus::Success,
        };

        with_storage(&self.storage, |s| s.insert_or_get_page(&page))
            .map_err(|e| format!("Failed to store page {}: {}", normalized, e))?;

        Ok(links)
    }

    fn transition_job(&self, to: JobState) -> Result<()> {
        let job_id = self.job_id;
        let job = with_storage(&self.storage, |s| s.get_job(job_id))?
            .ok_or(ForgeError::NotFound { kind: "job", id: job_id })?;

        let next = job.state.transition(to)?;
        with_storage(&self.storage, |s| s.update_job_state(job_id, next))?;
        Ok(())
    }
}

/// Marks a job failed unless it already reached a terminal state
fn fail_job(storage: &SharedStorage, job_id: i64, message: &str) -> Result<()> {
    with_storage(storage, |s| {
        match s.get_job(job_id)? {
            Some(job) if !job.state.is_terminal() => s.fail_job(job_id, message),
            _ => Ok(()),
        }
    })?;
    Ok(())
}

/// Marks a run failed unless it already reached a terminal state
fn fail_run(storage: &SharedStorage, run_id: i64, url: &str, message: &str) -> Result<()> {
    with_storage(storage, |s| {
        match s.get_run(run_id)? {
            Some(run) if !run.state.is_terminal() => {
                s.append_run_error(run_id, url, message)?;
                s.update_run_state(run_id, RunState::Failed)
            }
            _ => Ok(()),
        }
    })?;
    Ok(())
}

/// Runs a crawl as an independent background task
///
/// The trigger path creates the job and run records; from here on the task is
/// their only writer until they reach a terminal state.
pub fn spawn_crawl(
    config: Arc<Config>,
    storage: SharedStorage,
    job_id: i64,
    run_id: i64,
    seed_url: String,
) -> JoinHandle<Result<CrawlSummary>> {
    tokio::spawn(async move {
        match Coordinator::new(config, storage.clone(), job_id, run_id, seed_url.clone()) {
            Ok(coordinator) => coordinator.run().await,
            Err(e) => {
                let message = e.to_string();
                tracing::error!(job_id, run_id, "Could not start crawl: {}", message);
                if let Err(err) = fail_run(&storage, run_id, &seed_url, &message) {
                    tracing::error!("Failed to record run failure: {}", err);
                }
                if let Err(err) = fail_job(&storage, job_id, &message) {
                    tracing::error!("Failed to record job failure: {}", err);
                }
                Err(e)
            }
        }
    })
}
