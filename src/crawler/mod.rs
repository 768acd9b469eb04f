//! Crawler module for single-site content discovery
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with bounded timeout and redirects
//! - HTML content extraction and link discovery
//! - The per-run frontier and visited set
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;

pub use coordinator::{spawn_crawl, Coordinator, CrawlSummary};
pub use extractor::{extract_content, extract_links, ExtractedContent, Heading};
pub use fetcher::{build_http_client, fetch_page, FetchError, FetchFailure};
pub use frontier::{CrawlContext, Frontier, FrontierEntry};
