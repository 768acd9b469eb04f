//! FAQ Forge: a single-site crawler that turns page content into FAQs
//!
//! This crate crawls one website breadth-first, extracts readable content from
//! each page, and feeds that content through a rate-limited pipeline that asks
//! an external text-generation service for question/answer pairs. Crawl and
//! generation progress is persisted after every unit of work so a caller can
//! poll it while the background task runs.

pub mod config;
pub mod crawler;
pub mod generation;
pub mod output;
pub mod service;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for FAQ Forge operations
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed or missing caller input. Never touches persisted state.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: i64 },

    /// Terminal crawl failure recorded on both the job and its run
    #[error("Job failed: {0}")]
    JobFailure(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Generation error: {0}")]
    Generation(#[from] generation::GenerationError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing environment variable: {0}")]
    MissingEnv(String),
}

/// Result type alias for FAQ Forge operations
pub type Result<T> = std::result::Result<T, ForgeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use service::ForgeService;
pub use state::{JobState, PageStatus, RunState};
pub use url::{extract_domain, normalize_url, same_domain};
