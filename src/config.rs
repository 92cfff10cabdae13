//! Pipeline configuration.
//!
//! A single required value (the contact email NCBI asks every caller to send)
//! plus numeric tuning knobs. The binary fills this from CLI flags and
//! environment variables; library users build it directly.

use crate::error::{PubmedError, Result};
use crate::retry::RetryPolicy;
use std::time::Duration;

/// E-utilities base URL
pub const EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Default tool name sent with every request
pub const DEFAULT_TOOL: &str = "pubmed-scraper";

pub const DEFAULT_MAX_RESULTS: usize = 100;
pub const DEFAULT_CHUNK_SIZE: usize = 50;
pub const DEFAULT_PAGE_SIZE: usize = 500;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Largest identifier batch accepted for one efetch call
pub const MAX_CHUNK_SIZE: usize = 500;

/// NCBI allows 3 requests/s without an API key
pub const ANONYMOUS_MIN_INTERVAL: Duration = Duration::from_millis(340);

/// ...and 10 requests/s with one
pub const API_KEY_MIN_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Contact email sent as `email=` on every request
    pub email: String,
    /// Tool name sent as `tool=`
    pub tool: String,
    /// Optional NCBI API key
    pub api_key: Option<String>,
    /// E-utilities base URL (overridable for mirrors and tests)
    pub base_url: String,
    /// Search sort order (`relevance`, `pub_date`, ...)
    pub sort: Option<String>,
    pub max_results: usize,
    pub chunk_size: usize,
    pub page_size: usize,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub jitter: Duration,
    /// Minimum spacing between requests; `None` derives it from `api_key`
    pub min_interval: Option<Duration>,
    pub timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            email: String::new(),
            tool: DEFAULT_TOOL.to_string(),
            api_key: None,
            base_url: EUTILS_BASE_URL.to_string(),
            sort: Some("relevance".to_string()),
            max_results: DEFAULT_MAX_RESULTS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            jitter: Duration::ZERO,
            min_interval: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl PipelineConfig {
    /// Default configuration for the given contact email.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    /// Check the configuration before any request is made.
    pub fn validate(&self) -> Result<()> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(PubmedError::Config(
                "a contact email is required (--email or NCBI_EMAIL)".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(PubmedError::Config(format!(
                "contact email '{}' does not look like an email address",
                email
            )));
        }
        if self.tool.trim().is_empty() {
            return Err(PubmedError::Config("tool name must not be empty".to_string()));
        }
        if self.chunk_size == 0 || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(PubmedError::Config(format!(
                "chunk size must be between 1 and {}, got {}",
                MAX_CHUNK_SIZE, self.chunk_size
            )));
        }
        if self.page_size == 0 {
            return Err(PubmedError::Config("page size must be at least 1".to_string()));
        }
        if self.max_attempts == 0 {
            return Err(PubmedError::Config("max attempts must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Effective spacing enforced by the rate gate.
    pub fn effective_min_interval(&self) -> Duration {
        self.min_interval.unwrap_or(if self.api_key.is_some() {
            API_KEY_MIN_INTERVAL
        } else {
            ANONYMOUS_MIN_INTERVAL
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.base_delay).with_jitter(self.jitter)
    }
}
