//! Custom error types for pubmed-scraper.
//!
//! Every fallible library call returns `Result<T, PubmedError>`. Errors are
//! classified by [`ErrorKind`] so the retry executor can tell transient
//! failures from ones that will not heal on their own.

use thiserror::Error;

/// Main error type for pubmed-scraper operations.
#[derive(Debug, Error)]
pub enum PubmedError {
    /// Connection, timeout or body-read failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote service answered with a non-success status or an error payload
    #[error("Service error: {code} - {message}")]
    Service {
        /// HTTP status code (or 200 when the error came inside the payload)
        code: u16,
        /// Error message from the service
        message: String,
    },

    /// Response body could not be decoded into the expected structure
    #[error("Parse error: {0}")]
    Parse(String),

    /// A retryable error persisted through every attempt
    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetryExhausted {
        /// Number of attempts made
        attempts: u32,
        /// The last error observed
        #[source]
        last: Box<PubmedError>,
    },

    /// Identifiers were found but not a single record could be fetched
    #[error("Failed to fetch any of the {requested} requested records")]
    NothingFetched {
        /// Number of identifiers handed to the fetch stage
        requested: usize,
    },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for PubmedError {
    fn from(err: reqwest::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        PubmedError::Transport(message)
    }
}

/// Coarse classification used by the retry state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Service,
    Parse,
    Other,
}

impl ErrorKind {
    /// Only transport and service failures are worth another attempt.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::Transport | ErrorKind::Service)
    }
}

impl PubmedError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PubmedError::Transport(_) => ErrorKind::Transport,
            PubmedError::Service { .. } => ErrorKind::Service,
            PubmedError::Parse(_) | PubmedError::Json(_) => ErrorKind::Parse,
            _ => ErrorKind::Other,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// Result type alias using `PubmedError`
pub type Result<T> = std::result::Result<T, PubmedError>;

/// Extension trait for adding context to Option types
pub trait OptionExt<T> {
    /// Convert Option to Result with a parse error message
    fn ok_or_parse(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_parse(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| PubmedError::Parse(msg.to_string()))
    }
}
