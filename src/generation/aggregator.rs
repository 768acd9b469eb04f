//! Whole-job FAQ generation
//!
//! Walks a job's successfully crawled pages one at a time, skipping pages that
//! already have FAQs, and stores what the generator returns. Per-page failures
//! are logged and do not stop the batch.

use crate::config::GenerationConfig;
use crate::generation::decoder::GeneratedFaq;
use crate::generation::generator::FaqGenerator;
use crate::state::{add_faqs_to_latest_run, PageStatus};
use crate::storage::{with_storage, FaqRecord, NewFaq, PageRecord, SharedStorage, Storage};
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Pacing and defaults for a batch run
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub page_delay: Duration,
    pub default_confidence: f64,
}

impl BatchOptions {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            page_delay: Duration::from_millis(config.page_delay_ms),
            default_confidence: config.default_confidence,
        }
    }
}

/// Tallies of one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub job_id: i64,
    pub pages_total: usize,
    /// Pages that already had FAQs
    pub pages_skipped: usize,
    /// Pages whose content was too short to generate from
    pub pages_insufficient: usize,
    pub pages_failed: usize,
    pub faqs_generated: u32,
}

/// Stores generated FAQs against their page as unpublished records
///
/// The source section is the item's source, or the page title when the item
/// has none.
pub fn store_generated(
    storage: &SharedStorage,
    page: &PageRecord,
    faqs: &[GeneratedFaq],
    confidence: f64,
) -> Result<Vec<FaqRecord>> {
    let stored = with_storage(storage, |s| {
        let mut stored = Vec::with_capacity(faqs.len());
        for faq in faqs {
            let section = faq.source.clone().unwrap_or_else(|| page.title.clone());

            let id = s.insert_faq(&NewFaq {
                job_id: page.job_id,
                page_id: page.id,
                source_url: page.url.clone(),
                source_section: Some(section),
                question: faq.question.clone(),
                answer: faq.answer.clone(),
                confidence,
            })?;

            if let Some(record) = s.get_faq(id)? {
                stored.push(record);
            }
        }
        Ok(stored)
    })?;

    Ok(stored)
}

/// Generates FAQs for every successful page of a job that has none yet
///
/// Pages are processed serially with `page_delay` between generation calls.
/// When the batch ends the latest run's FAQ counter grows by the number of
/// FAQs stored.
pub async fn generate_for_job(
    generator: &FaqGenerator,
    storage: &SharedStorage,
    job_id: i64,
    options: BatchOptions,
) -> Result<BatchSummary> {
    let pages = with_storage(storage, |s| {
        s.get_pages_for_job(job_id, Some(PageStatus::Success))
    })?;

    tracing::info!(job_id, pages = pages.len(), "Starting FAQ generation");

    let mut summary = BatchSummary {
        job_id,
        pages_total: pages.len(),
        ..Default::default()
    };
    let mut attempted_any = false;

    for page in &pages {
        let existing = match with_storage(storage, |s| s.count_faqs_for_page(page.id)) {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(job_id, url = %page.url, "Could not count existing FAQs: {}", e);
                summary.pages_failed += 1;
                continue;
            }
        };

        if existing > 0 {
            tracing::debug!(job_id, url = %page.url, existing, "Skipping page with existing FAQs");
            summary.pages_skipped += 1;
            continue;
        }

        if attempted_any && !options.page_delay.is_zero() {
            tokio::time::sleep(options.page_delay).await;
        }
        attempted_any = true;

        match generator.generate(&page.text, &page.url).await {
            Ok(outcome) if outcome.success => {
                match store_generated(storage, page, &outcome.faqs, options.default_confidence) {
                    Ok(stored) => {
                        summary.faqs_generated += stored.len() as u32;
                        tracing::debug!(job_id, url = %page.url, count = stored.len(), "Stored FAQs");
                    }
                    Err(e) => {
                        tracing::warn!(job_id, url = %page.url, "Failed to store FAQs: {}", e);
                        summary.pages_failed += 1;
                    }
                }
            }
            Ok(outcome) => {
                tracing::debug!(
                    job_id,
                    url = %page.url,
                    "No FAQs generated: {}",
                    outcome.message.unwrap_or_default()
                );
                summary.pages_insufficient += 1;
            }
            Err(e) => {
                tracing::warn!(job_id, url = %page.url, "Error generating FAQs: {}", e);
                summary.pages_failed += 1;
            }
        }
    }

    add_faqs_to_latest_run(storage, job_id, summary.faqs_generated)?;

    tracing::info!(
        job_id,
        faqs = summary.faqs_generated,
        skipped = summary.pages_skipped,
        failed = summary.pages_failed,
        "FAQ generation finished"
    );

    Ok(summary)
}

/// Runs `generate_for_job` as an independent background task
pub fn spawn_generation(
    generator: Arc<FaqGenerator>,
    storage: SharedStorage,
    job_id: i64,
    options: BatchOptions,
) -> JoinHandle<Result<BatchSummary>> {
    tokio::spawn(async move {
        let result = generate_for_job(&generator, &storage, job_id, options).await;
        if let Err(e) = &result {
            tracing::error!(job_id, "FAQ generation batch failed: {}", e);
        }
        result
    })
}
