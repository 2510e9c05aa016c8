//! Shelftalker error types

use std::time::Duration;

/// Shelftalker error types
#[derive(Debug, thiserror::Error)]
pub enum ShelftalkerError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The upstream generation provider rate-limited us (HTTP 429).
    /// Transient; the retry layer honours `retry_after` when present.
    #[error("provider rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Admission control denied the request. Carries the quota metadata
    /// calling code surfaces as response headers. Never auto-retried.
    #[error("rate limit exceeded: {limit} requests per window, resets at {reset_at_ms}")]
    RateLimitExceeded {
        limit: u32,
        remaining: u32,
        reset_at_ms: u64,
    },

    /// The generation backend failed (network, provider error, timeout).
    /// Carries the underlying cause message; callers may retry with
    /// backoff or fall back to cached data.
    #[error("generation failed: {0}")]
    Generation(String),

    /// The backing document store could not be reached. Components
    /// translate this per their failure policy (fail open, degrade to
    /// miss, drop the write) rather than propagating it to callers.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    // Input errors
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors
    #[error("no provider configured")]
    NoProvider,

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ShelftalkerError {
    /// Whether this error is worth retrying.
    ///
    /// Transient: network failures, provider rate limits, and 5xx
    /// responses. Everything else (auth, validation, admission denials)
    /// is permanent and returned to the caller immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Provider-supplied retry hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias for Shelftalker operations
pub type Result<T> = std::result::Result<T, ShelftalkerError>;
