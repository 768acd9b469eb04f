//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured client signature
//! - Single-attempt GET requests with a bounded timeout
//! - Bounded redirect following
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::{redirect::Policy, Client};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why a single fetch attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// Server answered with a non-2xx status
    Status(u16),

    /// The request exceeded the configured timeout
    Timeout,

    /// The redirect chain was longer than allowed
    TooManyRedirects,

    /// Connection, TLS or protocol failure
    Transport(String),

    /// The response body could not be read as text
    Body(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Timeout => write!(f, "request timed out"),
            Self::TooManyRedirects => write!(f, "too many redirects"),
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::Body(msg) => write!(f, "failed to read body: {}", msg),
        }
    }
}

/// A failed fetch of one URL
#[derive(Debug, Clone, Error)]
#[error("Failed to fetch {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchFailure,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: FetchFailure) -> Self {
        Self {
            url: url.into(),
            cause,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `crawler` - Timeout and redirect limits
/// * `user_agent` - The identifying client signature
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use faq_forge::config::Config;
/// use faq_forge::crawler::build_http_client;
///
/// let config = Config::default();
/// let client = build_http_client(&config.crawler, &config.user_agent).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.signature())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.request_timeout_secs))
        .redirect(Policy::limited(crawler.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one URL and returns its body as text
///
/// Makes exactly one attempt. Any non-2xx final status, timeout, or transport
/// failure is returned as a `FetchError` naming the URL.
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::new(url, classify(&e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::new(url, FetchFailure::Status(status.as_u16())));
    }

    response
        .text()
        .await
        .map_err(|e| FetchError::new(url, FetchFailure::Body(e.to_string())))
}

fn classify(err: &reqwest::Error) -> FetchFailure {
    if err.is_timeout() {
        FetchFailure::Timeout
    } else if err.is_redirect() {
        FetchFailure::TooManyRedirects
    } else if let Some(status) = err.status() {
        FetchFailure::Status(status.as_u16())
    } else {
        FetchFailure::Transport(err.to_string())
    }
}
