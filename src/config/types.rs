use serde::Deserialize;

/// Main configuration structure for FAQ Forge
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub generation: GenerationConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum link depth to follow from the seed URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of page results (success or failure) per crawl run
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Maximum redirects followed for a single fetch
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// Delay between consecutive fetch attempts (milliseconds)
    #[serde(rename = "politeness-delay-ms")]
    pub politeness_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 20,
            request_timeout_secs: 10,
            max_redirects: 5,
            politeness_delay_ms: 500,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "FAQForge".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Renders the identifying client signature sent with every request
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn signature(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// External text-generation service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the chat-completions compatible API
    #[serde(rename = "api-base-url")]
    pub api_base_url: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    pub model: String,

    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    pub temperature: f32,

    /// Timeout for one completion request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Maximum characters per chunk sent to the service
    #[serde(rename = "chunk-size")]
    pub chunk_size: usize,

    /// Content shorter than this (trimmed, in characters) is never sent
    #[serde(rename = "min-content-length")]
    pub min_content_length: usize,

    /// Delay between chunk calls when a page has more than one chunk (milliseconds)
    #[serde(rename = "chunk-delay-ms")]
    pub chunk_delay_ms: u64,

    /// Delay between pages in a whole-job batch (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// Confidence score stored on generated records
    #[serde(rename = "default-confidence")]
    pub default_confidence: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-4o".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
            request_timeout_secs: 60,
            chunk_size: 4000,
            min_content_length: 200,
            chunk_delay_ms: 1000,
            page_delay_ms: 2000,
            default_confidence: 0.8,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "faq-forge.db".to_string(),
        }
    }
}
