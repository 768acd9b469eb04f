//! FAQ generation for one piece of page content
//!
//! The generator applies the minimum-content guard, chunks the text, sends
//! each chunk to the completion service in turn and merges what decodes.

use crate::config::GenerationConfig;
use crate::generation::chunker::chunk_text;
use crate::generation::client::{CompletionClient, GenerationError};
use crate::generation::decoder::{decode_response, to_faqs, DecodedResponse, GeneratedFaq};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that generates factual FAQs \
                                 from website content. Always respond with valid JSON.";

pub const NOT_ENOUGH_CONTENT: &str = "Not enough content to generate a reliable FAQ.";

/// Result of generating FAQs for one page
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub faqs: Vec<GeneratedFaq>,
}

impl GenerationOutcome {
    /// The outcome for content below the generation minimum
    pub fn insufficient_content() -> Self {
        Self {
            success: false,
            message: Some(NOT_ENOUGH_CONTENT.to_string()),
            faqs: Vec::new(),
        }
    }
}

/// Returns true if trimmed `content` has at least `min_chars` characters
pub fn has_enough_content(content: &str, min_chars: usize) -> bool {
    content.trim().chars().count() >= min_chars
}

/// Builds the per-chunk instruction sent as the user message
pub fn build_prompt(content: &str, source_url: &str) -> String {
    format!(
        r#"You are an AI assistant that generates FAQs strictly from the provided website content.

RULES:
1. Use ONLY the content below.
2. Do NOT add external knowledge.
3. If answer is not present, say 'Information not available in the source content.'
4. Generate user-friendly questions.
5. Keep answers under 120 words.

CONTENT:
{content}

Return JSON array with this structure:
[
  {{
    "question": "...",
    "answer": "...",
    "source": "{source_url}"
  }}
]

Generate 3-5 FAQs if sufficient content is available. If content is insufficient, return an empty array."#
    )
}

/// Generates FAQs through a completion service
pub struct FaqGenerator {
    client: Arc<dyn CompletionClient>,
    chunk_size: usize,
    min_content_length: usize,
    chunk_delay: Duration,
}

impl FaqGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, config: &GenerationConfig) -> Self {
        Self {
            client,
            chunk_size: config.chunk_size,
            min_content_length: config.min_content_length,
            chunk_delay: Duration::from_millis(config.chunk_delay_ms),
        }
    }

    /// Generates FAQs for `content` fetched from `source_url`
    ///
    /// Content shorter than the configured minimum returns an unsuccessful
    /// outcome without calling the service. Chunks are sent one at a time;
    /// a chunk whose response cannot be decoded contributes nothing.
    ///
    /// # Returns
    ///
    /// * `Ok(GenerationOutcome)` - Merged FAQs from every chunk, or the guard failure
    /// * `Err(GenerationError)` - The service call itself failed
    pub async fn generate(
        &self,
        content: &str,
        source_url: &str,
    ) -> Result<GenerationOutcome, GenerationError> {
        let content = content.trim();
        if !has_enough_content(content, self.min_content_length) {
            tracing::debug!(url = source_url, "Content below generation minimum");
            return Ok(GenerationOutcome::insufficient_content());
        }

        let chunks = chunk_text(content, self.chunk_size);
        let mut faqs = Vec::new();

        for (index, chunk) in chunks.iter().enumerate() {
            if index > 0 && !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }

            let prompt = build_prompt(chunk, source_url);
            let raw = self.client.complete(SYSTEM_PROMPT, &prompt).await?;
            let decoded = decode_response(&raw);

            if let DecodedResponse::Unparseable { reason } = &decoded {
                tracing::warn!(
                    url = source_url,
                    chunk = index,
                    "Skipping unparseable response: {}",
                    reason
                );
                continue;
            }

            let chunk_faqs = to_faqs(decoded.items().unwrap_or_default());
            tracing::debug!(
                url = source_url,
                chunk = index,
                shape = decoded.shape(),
                count = chunk_faqs.len(),
                "Decoded generation response"
            );
            faqs.extend(chunk_faqs);
        }

        Ok(GenerationOutcome {
            success: true,
            message: None,
            faqs,
        })
    }
}
