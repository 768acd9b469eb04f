//! Per-run crawl frontier
//!
//! The frontier is a FIFO queue of `(url, depth)` entries plus a visited set of
//! normalized URLs. Each run owns its own `CrawlContext`; nothing here is shared
//! between tasks.

use crate::url::extract_domain;
use crate::ForgeError;
use std::collections::{HashSet, VecDeque};

/// A URL waiting to be fetched, with the depth it was discovered at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
}

/// BFS queue and visited set for one crawl run
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    visited: HashSet<String>,
}

impl Frontier {
    /// Creates a frontier seeded with `seed_url` at depth 0
    pub fn new(seed_url: &str) -> Self {
        let mut frontier = Self::default();
        frontier.queue.push_back(FrontierEntry {
            url: seed_url.to_string(),
            depth: 0,
        });
        frontier
    }

    /// Enqueues a normalized URL unless it has already been visited
    ///
    /// Returns true if the URL was queued.
    pub fn push(&mut self, url: String, depth: u32) -> bool {
        if self.visited.contains(&url) {
            return false;
        }
        self.queue.push_back(FrontierEntry { url, depth });
        true
    }

    pub fn pop(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    /// Marks a normalized URL as visited
    ///
    /// Called when the URL is dequeued for fetching, not when it is queued.
    /// Returns false if it was already visited.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

/// Everything a single crawl run needs to carry through the BFS loop
#[derive(Debug)]
pub struct CrawlContext {
    pub job_id: i64,
    pub run_id: i64,
    pub seed_url: String,
    pub domain: String,
    pub frontier: Frontier,
    pub pages_succeeded: u32,
    pub pages_failed: u32,
}

impl CrawlContext {
    /// Creates the context for a run, deriving the crawl domain from the seed
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlContext)` - Ready to crawl
    /// * `Err(ForgeError::JobFailure)` - The seed URL has no parseable host
    pub fn new(job_id: i64, run_id: i64, seed_url: &str) -> Result<Self, ForgeError> {
        let domain = extract_domain(seed_url)
            .ok_or_else(|| ForgeError::JobFailure(format!("Invalid seed URL: {}", seed_url)))?;

        Ok(Self {
            job_id,
            run_id,
            seed_url: seed_url.to_string(),
            domain,
            frontier: Frontier::new(seed_url),
            pages_succeeded: 0,
            pages_failed: 0,
        })
    }

    /// Number of page results recorded so far, successful or not
    pub fn results(&self) -> u32 {
        self.pages_succeeded + self.pages_failed
    }
}
