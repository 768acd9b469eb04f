//! Human-readable rendering of jobs, runs, pages and FAQs
//!
//! Each `format_*` function returns the text; the `print_*` wrappers write it
//! to stdout for the CLI.

use crate::service::JobStatus;
use crate::storage::{FaqRecord, JobRecord, PageRecord};

/// Formats a job with its latest run
pub fn format_job_status(status: &JobStatus) -> String {
    let job = &status.job;
    let mut out = String::new();

    out.push_str(&format!("=== Job {} ===\n\n", job.id));
    out.push_str(&format!("Seed URL: {}\n", job.seed_url));
    out.push_str(&format!("Domain: {}\n", job.domain));
    out.push_str(&format!("State: {}\n", job.state));
    out.push_str(&format!("Total pages: {}\n", job.total_pages));
    if let Some(started) = &job.started_at {
        out.push_str(&format!("Started: {}\n", started));
    }
    if let Some(completed) = &job.completed_at {
        out.push_str(&format!("Completed: {}\n", completed));
    }
    if let Some(message) = &job.error_message {
        out.push_str(&format!("Error: {}\n", message));
    }
    out.push('\n');

    match &status.run {
        Some(run) => {
            let c = &run.counters;
            out.push_str(&format!("Latest run {} ({}):\n", run.id, run.state));
            out.push_str(&format!("  Progress: {}%\n", run.progress));
            out.push_str(&format!("  Pages discovered: {}\n", c.pages_discovered));
            out.push_str(&format!("  Pages crawled: {}\n", c.pages_crawled));
            out.push_str(&format!("  Pages failed: {}\n", c.pages_failed));
            out.push_str(&format!("  FAQs generated: {}\n", c.faqs_generated));

            if !run.errors.is_empty() {
                out.push_str(&format!("\n  Errors ({}):\n", run.errors.len()));
                for entry in &run.errors {
                    out.push_str(&format!(
                        "  - [{}] {}: {}\n",
                        entry.timestamp, entry.url, entry.message
                    ));
                }
            }
        }
        None => {
            out.push_str("No runs recorded\n");
        }
    }

    out
}

/// Formats a one-line-per-job listing
pub fn format_jobs(jobs: &[JobRecord]) -> String {
    if jobs.is_empty() {
        return "No jobs found\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:<10} {:>6}  {}\n",
        "ID", "STATE", "PAGES", "SEED URL"
    ));
    for job in jobs {
        out.push_str(&format!(
            "{:<6} {:<10} {:>6}  {}\n",
            job.id,
            job.state.to_db_string(),
            job.total_pages,
            job.seed_url
        ));
    }
    out
}

/// Formats a one-line-per-page listing
pub fn format_pages(pages: &[PageRecord]) -> String {
    if pages.is_empty() {
        return "No pages found\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:<8} {:>6}  {}\n",
        "ID", "STATUS", "WORDS", "URL"
    ));
    for page in pages {
        out.push_str(&format!(
            "{:<6} {:<8} {:>6}  {} ({})\n",
            page.id,
            page.status.to_db_string(),
            page.word_count,
            page.url,
            page.title
        ));
    }
    out
}

/// Formats one page's full extracted record
pub fn format_page(page: &PageRecord) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Page {} ===\n\n", page.id));
    out.push_str(&format!("URL: {}\n", page.url));
    out.push_str(&format!("Title: {}\n", page.title));
    out.push_str(&format!("Status: {}\n", page.status));
    out.push_str(&format!("Words: {}\n", page.word_count));
    out.push_str(&format!("Crawled: {}\n\n", page.crawled_at));

    if !page.headings.is_empty() {
        out.push_str("Headings:\n");
        for heading in &page.headings {
            let indent = "  ".repeat(heading.level as usize);
            out.push_str(&format!("{}h{} {}\n", indent, heading.level, heading.text));
        }
        out.push('\n');
    }

    out.push_str(&format!("Extracted text:\n{}\n", page.text));
    out
}

/// Formats FAQ records with their ids and flags
pub fn format_faqs(faqs: &[FaqRecord]) -> String {
    if faqs.is_empty() {
        return "No FAQs found\n".to_string();
    }

    let mut out = String::new();
    for faq in faqs {
        let mut flags = Vec::new();
        if faq.published {
            flags.push("published");
        }
        if faq.edited {
            flags.push("edited");
        }

        out.push_str(&format!(
            "#{} [{}] {}\n",
            faq.id,
            flags.join(", "),
            faq.question
        ));
        out.push_str(&format!("    {}\n", faq.answer));
        out.push_str(&format!(
            "    source: {} (confidence {:.2})\n\n",
            faq.source_url, faq.confidence
        ));
    }
    out
}

pub fn print_job_status(status: &JobStatus) {
    print!("{}", format_job_status(status));
}

pub fn print_jobs(jobs: &[JobRecord]) {
    print!("{}", format_jobs(jobs));
}

pub fn print_pages(pages: &[PageRecord]) {
    print!("{}", format_pages(pages));
}

pub fn print_page(page: &PageRecord) {
    print!("{}", format_page(page));
}

pub fn print_faqs(faqs: &[FaqRecord]) {
    print!("{}", format_faqs(faqs));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{JobState, RunCounters, RunState};
    use crate::storage::{RunErrorEntry, RunRecord};

    fn job() -> JobRecord {
        JobRecord {
            id: 7,
            seed_url: "https://a.test".to_string(),
            domain: "a.test".to_string(),
            state: JobState::Completed,
            total_pages: 3,
            error_message: None,
            started_at: Some("2024-05-01T10:00:00Z".to_string()),
            completed_at: Some("2024-05-01T10:01:00Z".to_string()),
            created_at: "2024-05-01T10:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_format_job_status_with_run() {
        let status = JobStatus {
            job: job(),
            run: Some(RunRecord {
                id: 3,
                job_id: 7,
                state: RunState::Completed,
                counters: RunCounters {
                    pages_discovered: 4,
                    pages_crawled: 3,
                    pages_failed: 1,
                    faqs_generated: 9,
                },
                progress: 75,
                errors: vec![RunErrorEntry {
                    url: "https://a.test/gone".to_string(),
                    message: "HTTP 404".to_string(),
                    timestamp: "2024-05-01T10:00:30Z".to_string(),
                }],
                started_at: None,
                completed_at: None,
                created_at: "2024-05-01T10:00:00Z".to_string(),
            }),
        };

        let text = format_job_status(&status);
        assert!(text.contains("=== Job 7 ==="));
        assert!(text.contains("State: completed"));
        assert!(text.contains("Progress: 75%"));
        assert!(text.contains("FAQs generated: 9"));
        assert!(text.contains("https://a.test/gone: HTTP 404"));
    }

    #[test]
    fn test_format_job_without_run() {
        let status = JobStatus {
            job: job(),
            run: None,
        };
        assert!(format_job_status(&status).contains("No runs recorded"));
    }

    #[test]
    fn test_format_pages_and_page() {
        use crate::crawler::Heading;
        use crate::state::PageStatus;

        assert_eq!(format_pages(&[]), "No pages found\n");

        let page = PageRecord {
            id: 11,
            job_id: 7,
            url: "https://a.test/pricing".to_string(),
            title: "Pricing".to_string(),
            headings: vec![Heading {
                level: 2,
                text: "Plans".to_string(),
            }],
            paragraphs: Vec::new(),
            text: "HEADINGS:\n## Plans".to_string(),
            word_count: 2,
            status: PageStatus::Success,
            crawled_at: "2024-05-01T10:00:10Z".to_string(),
        };

        let listing = format_pages(std::slice::from_ref(&page));
        assert_eq!(listing.lines().count(), 2);
        assert!(listing.ends_with("https://a.test/pricing (Pricing)\n"));

        let detail = format_page(&page);
        assert!(detail.starts_with("=== Page 11 ===\n\n"));
        assert!(detail.contains("    h2 Plans\n"));
        assert!(detail.ends_with("Extracted text:\nHEADINGS:\n## Plans\n"));
    }

    #[test]
    fn test_format_jobs() {
        assert_eq!(format_jobs(&[]), "No jobs found\n");
        let text = format_jobs(&[job()]);
        assert!(text.lines().count() == 2);
        assert!(text.contains("https://a.test"));
    }
}
