//! URL handling module for FAQ Forge
//!
//! This module provides URL canonicalization, domain extraction, and the
//! same-domain test used to keep a crawl on a single site.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, same_domain};
pub use normalize::{is_crawlable_seed, normalize_url};
