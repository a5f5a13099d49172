// Error types for follow-fellow.
// Separates transient GitHub failures (retried) from permanent ones and run-wide budget aborts.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FellowError {
    #[error("GitHub API error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Gave up after {attempts} attempts (last status: {status})")]
    RetriesExhausted { status: String, attempts: u32 },

    #[error("Error budget exceeded: {failures} failures (max {max}), aborting run")]
    ErrorBudgetExceeded { failures: u32, max: u32 },

    #[error("Request limit reached: {max} API requests in this run")]
    RequestLimitReached { max: u32 },

    #[error("Pagination loop detected at {0}")]
    PaginationLoop(String),

    #[error("Pagination exceeded {0} pages")]
    PageLimit(usize),

    #[error("Missing GitHub token: set GITHUB_TOKEN or pass --token")]
    MissingToken,

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl FellowError {
    /// Whether the failure is worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, FellowError::Network(_) | FellowError::RetriesExhausted { .. })
    }

    /// Whether the failure aborts the whole run rather than a single call.
    pub fn is_budget(&self) -> bool {
        matches!(
            self,
            FellowError::ErrorBudgetExceeded { .. } | FellowError::RequestLimitReached { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FellowError>;
