//! Service layer exposing FAQ Forge operations
//!
//! `ForgeService` is the entry point used by the CLI (or any other front end).
//! Trigger operations create records and hand off to background tasks; query
//! and edit operations work directly against storage.

use crate::config::Config;
use crate::crawler::{spawn_crawl, CrawlSummary};
use crate::generation::{
    has_enough_content, spawn_generation, store_generated, BatchOptions, BatchSummary,
    CompletionClient, FaqGenerator, GenerationOutcome, OpenAiClient,
};
use crate::output::{build_export, FaqExport};
use crate::state::{add_faqs_to_latest_run, latest_run, JobState, PageStatus, RunState};
use crate::storage::{
    open_storage, shared, with_storage, FaqFilter, FaqRecord, FaqUpdate, JobRecord, PageRecord,
    RunRecord, SharedStorage, Storage,
};
use crate::url::{extract_domain, is_crawlable_seed};
use crate::{ConfigError, ForgeError, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Identifiers and initial state returned when a crawl is accepted
#[derive(Debug)]
pub struct CrawlTrigger {
    pub job_id: i64,
    pub run_id: i64,
    pub job_state: JobState,
    pub run_state: RunState,
    /// The background crawl; awaiting it is optional
    pub handle: JoinHandle<Result<CrawlSummary>>,
}

/// A job together with its most recent run
#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub job: JobRecord,
    pub run: Option<RunRecord>,
}

/// Returned when a whole-job generation batch is accepted
#[derive(Debug)]
pub struct GenerationTrigger {
    pub job_id: i64,
    pub pages: usize,
    pub handle: JoinHandle<Result<BatchSummary>>,
}

/// Result of generating FAQs for a single page
#[derive(Debug, Clone, Serialize)]
pub struct PageGeneration {
    pub success: bool,
    pub message: String,
    pub faqs: Vec<FaqRecord>,
}

/// FAQ Forge operations over shared storage
pub struct ForgeService {
    config: Arc<Config>,
    storage: SharedStorage,
    /// Absent when no API key was available at startup
    generator: Option<Arc<FaqGenerator>>,
}

impl ForgeService {
    /// Creates a service over existing storage and a completion client
    pub fn new(config: Config, storage: SharedStorage, client: Arc<dyn CompletionClient>) -> Self {
        let generator = Arc::new(FaqGenerator::new(client, &config.generation));
        Self {
            config: Arc::new(config),
            storage,
            generator: Some(generator),
        }
    }

    /// Opens the configured database and builds an OpenAI client from the environment
    ///
    /// A missing API key does not prevent opening; generation operations fail
    /// with `ConfigError::MissingEnv` until one is provided.
    ///
    /// # Returns
    ///
    /// * `Ok(ForgeService)` - Ready to use
    /// * `Err(ForgeError)` - The database could not be opened
    pub fn open(config: Config) -> Result<Self> {
        let storage = shared(open_storage(Path::new(&config.output.database_path))?);

        match OpenAiClient::from_env(&config.generation) {
            Ok(client) => Ok(Self::new(config, storage, Arc::new(client))),
            Err(ForgeError::Config(e @ ConfigError::MissingEnv(_))) => {
                tracing::debug!("Generation disabled: {}", e);
                Ok(Self {
                    config: Arc::new(config),
                    storage,
                    generator: None,
                })
            }
            Err(e) => Err(e),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Accepts a seed URL and starts crawling it in the background
    ///
    /// The job for the seed is created, or reset if it already exists, and a
    /// fresh run is created. Invalid seeds are rejected without touching storage.
    pub fn trigger_crawl(&self, seed_url: &str) -> Result<CrawlTrigger> {
        let seed_url = seed_url.trim();
        if seed_url.is_empty() {
            return Err(ForgeError::Validation("URL is required".to_string()));
        }
        if !is_crawlable_seed(seed_url) {
            return Err(ForgeError::Validation(format!("Invalid URL: {}", seed_url)));
        }
        let domain = extract_domain(seed_url)
            .ok_or_else(|| ForgeError::Validation(format!("Invalid URL: {}", seed_url)))?;

        let (job, run) = with_storage(&self.storage, |s| {
            let job = s.upsert_job(seed_url, &domain)?;
            let run = s.create_run(job.id)?;
            Ok((job, run))
        })?;

        tracing::info!(job_id = job.id, run_id = run.id, url = seed_url, "Crawl triggered");

        let handle = spawn_crawl(
            Arc::clone(&self.config),
            self.storage.clone(),
            job.id,
            run.id,
            seed_url.to_string(),
        );

        Ok(CrawlTrigger {
            job_id: job.id,
            run_id: run.id,
            job_state: job.state,
            run_state: run.state,
            handle,
        })
    }

    /// Returns a job and its latest run
    pub fn job_status(&self, job_id: i64) -> Result<JobStatus> {
        let job = self.require_job(job_id)?;
        let run = latest_run(&self.storage, job_id)?;
        Ok(JobStatus { job, run })
    }

    /// Returns all jobs, newest first
    pub fn list_jobs(&self) -> Result<Vec<JobRecord>> {
        Ok(with_storage(&self.storage, |s| s.list_jobs())?)
    }

    /// Returns a job's pages, newest first
    pub fn list_pages(&self, job_id: i64) -> Result<Vec<PageRecord>> {
        self.require_job(job_id)?;
        Ok(with_storage(&self.storage, |s| s.get_pages_for_job(job_id, None))?)
    }

    /// Returns the most recently crawled pages across all jobs
    pub fn list_recent_pages(&self, limit: u32) -> Result<Vec<PageRecord>> {
        Ok(with_storage(&self.storage, |s| s.list_recent_pages(limit))?)
    }

    pub fn get_page(&self, page_id: i64) -> Result<PageRecord> {
        with_storage(&self.storage, |s| s.get_page(page_id))?.ok_or(ForgeError::NotFound {
            kind: "page",
            id: page_id,
        })
    }

    /// Generates and stores FAQs for one page, waiting for the result
    ///
    /// Content too short to generate from yields an unsuccessful result rather
    /// than an error. Service failures are returned as `ForgeError::Generation`.
    pub async fn generate_for_page(&self, page_id: i64) -> Result<PageGeneration> {
        let page = self.get_page(page_id)?;

        // Checked before requiring a generator: short pages need no API key
        let min_len = self.config.generation.min_content_length;
        let outcome = if has_enough_content(&page.text, min_len) {
            self.generator()?.generate(&page.text, &page.url).await?
        } else {
            GenerationOutcome::insufficient_content()
        };
        if !outcome.success {
            return Ok(PageGeneration {
                success: false,
                message: outcome.message.unwrap_or_default(),
                faqs: Vec::new(),
            });
        }

        let stored = store_generated(
            &self.storage,
            &page,
            &outcome.faqs,
            self.config.generation.default_confidence,
        )?;
        add_faqs_to_latest_run(&self.storage, page.job_id, stored.len() as u32)?;

        tracing::info!(page_id, job_id = page.job_id, count = stored.len(), "Generated FAQs for page");

        Ok(PageGeneration {
            success: true,
            message: format!("Generated {} FAQs", stored.len()),
            faqs: stored,
        })
    }

    /// Starts generating FAQs for every successful page of a job
    ///
    /// Rejected when the job has no successfully crawled pages.
    pub fn generate_for_job(&self, job_id: i64) -> Result<GenerationTrigger> {
        let generator = self.generator()?;
        self.require_job(job_id)?;

        let pages = with_storage(&self.storage, |s| {
            s.count_pages_for_job(job_id, PageStatus::Success)
        })? as usize;

        if pages == 0 {
            return Err(ForgeError::Validation(
                "No successfully crawled pages found".to_string(),
            ));
        }

        let handle = spawn_generation(
            generator,
            self.storage.clone(),
            job_id,
            BatchOptions::from_config(&self.config.generation),
        );

        tracing::info!(job_id, pages, "FAQ generation started");

        Ok(GenerationTrigger {
            job_id,
            pages,
            handle,
        })
    }

    /// Returns FAQs matching the filter, newest first
    pub fn list_faqs(&self, filter: FaqFilter) -> Result<Vec<FaqRecord>> {
        Ok(with_storage(&self.storage, |s| s.list_faqs(&filter))?)
    }

    /// Applies a partial edit to a FAQ
    ///
    /// Any question or answer change marks the FAQ as edited.
    pub fn update_faq(&self, faq_id: i64, update: FaqUpdate) -> Result<FaqRecord> {
        if update.is_empty() {
            return Err(ForgeError::Validation("No fields to update".to_string()));
        }
        if update.question.as_deref().is_some_and(|q| q.trim().is_empty()) {
            return Err(ForgeError::Validation("Question cannot be empty".to_string()));
        }
        if update.answer.as_deref().is_some_and(|a| a.trim().is_empty()) {
            return Err(ForgeError::Validation("Answer cannot be empty".to_string()));
        }

        with_storage(&self.storage, |s| s.update_faq(faq_id, &update))?.ok_or(
            ForgeError::NotFound {
                kind: "faq",
                id: faq_id,
            },
        )
    }

    pub fn delete_faq(&self, faq_id: i64) -> Result<()> {
        let deleted = with_storage(&self.storage, |s| s.delete_faq(faq_id))?;
        if !deleted {
            return Err(ForgeError::NotFound {
                kind: "faq",
                id: faq_id,
            });
        }
        Ok(())
    }

    /// Builds an export snapshot of the FAQs matching the filter
    pub fn export_faqs(&self, filter: FaqFilter) -> Result<FaqExport> {
        let faqs = self.list_faqs(filter)?;
        Ok(build_export(&faqs))
    }

    fn generator(&self) -> Result<Arc<FaqGenerator>> {
        self.generator.clone().ok_or_else(|| {
            ConfigError::MissingEnv(self.config.generation.api_key_env.clone()).into()
        })
    }

    fn require_job(&self, job_id: i64) -> Result<JobRecord> {
        with_storage(&self.storage, |s| s.get_job(job_id))?.ok_or(ForgeError::NotFound {
            kind: "job",
            id: job_id,
        })
    }
}
