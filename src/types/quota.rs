//! Admission control types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which class of endpoint a rate window covers. Each class gets its own
/// window per identity, so a burst of searches cannot starve feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointClass {
    Search,
    Chat,
    Feedback,
}

impl EndpointClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Chat => "chat",
            Self::Feedback => "feedback",
        }
    }
}

/// Persisted fixed-window counter document.
///
/// `count` never exceeds the configured maximum for an admitted window;
/// a new window always starts with `count = 1`. Rolled-over windows are
/// silently superseded in place, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateWindow {
    pub identity: String,
    pub endpoint: String,
    pub count: u32,
    pub window_start_ms: u64,
    pub last_request_ms: u64,
}

/// Outcome of an admission check, with the quota metadata calling code
/// surfaces as response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at_ms: u64,
}

/// Per-endpoint limit configuration.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Maximum admitted requests per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60),
        }
    }
}
