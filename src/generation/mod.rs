//! FAQ generation pipeline
//!
//! # Components
//!
//! - `chunk_text`: splits long page text on paragraph and sentence boundaries
//! - `CompletionClient` / `OpenAiClient`: transport to the text-generation service
//! - `decode_response`: tagged-variant decoding of raw service output
//! - `FaqGenerator`: content guard, prompting and per-chunk merging for one page
//! - `generate_for_job`: idempotent whole-job batch with per-page pacing

mod aggregator;
mod chunker;
mod client;
mod decoder;
mod generator;

pub use aggregator::{
    generate_for_job, spawn_generation, store_generated, BatchOptions, BatchSummary,
};
pub use chunker::chunk_text;
pub use client::{CompletionClient, GenerationError, OpenAiClient};
pub use decoder::{decode_response, to_faqs, DecodedResponse, GeneratedFaq};
pub use generator::{
    build_prompt, has_enough_content, FaqGenerator, GenerationOutcome, NOT_ENOUGH_CONTENT,
    SYSTEM_PROMPT,
};
