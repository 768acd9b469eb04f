//! Output module for exports and CLI reports
//!
//! This module handles:
//! - Building and writing FAQ export snapshots
//! - Rendering job status, page and FAQ listings for the terminal

mod export;
mod report;

pub use export::{build_export, export_file_name, write_export, ExportedFaq, FaqExport};
pub use report::{
    format_faqs, format_job_status, format_jobs, format_page, format_pages, print_faqs,
    print_job_status, print_jobs, print_page, print_pages,
};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
