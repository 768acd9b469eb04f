//! Configuration module for FAQ Forge
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing keys fall back to the built-in defaults.
//!
//! # Example
//!
//! ```no_run
//! use faq_forge::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("faq-forge.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, GenerationConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default, parse_config};
pub use validation::validate;
