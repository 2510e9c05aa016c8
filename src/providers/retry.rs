//! Retry configuration and the retrying provider decorator.
//!
//! [`RetryConfig`] controls backoff; [`RetryingProvider`] wraps any
//! [`GenerationProvider`] with automatic retry on transient errors, so
//! backends stay retry-free.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::warn;

use super::traits::GenerationProvider;
use crate::telemetry;
use crate::types::GenerateOptions;
use crate::{Result, ShelftalkerError};

/// Configuration for retry behaviour on transient errors.
///
/// Uses exponential backoff with optional jitter:
///
/// ```rust
/// # use shelftalker::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(5)
///     .initial_delay(Duration::from_millis(200))
///     .jitter(true);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 3.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 500ms.
    pub initial_delay: Duration,
    /// Maximum delay between retries (caps exponential growth). Default: 30s.
    pub max_delay: Duration,
    /// Whether to randomise delays into `[50%, 100%]` of the computed
    /// value, de-correlating concurrent callers. Default: true.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the base delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enable or disable jitter.
    pub fn jitter(mut self, enabled: bool) -> Self {
        self.jitter = enabled;
        self
    }

    /// Backoff for a given attempt number (0-indexed):
    /// `initial_delay * 2^attempt`, capped at `max_delay`. No jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }

    /// The delay actually slept: a provider `retry_after` hint wins
    /// outright; otherwise the capped backoff, jittered when enabled.
    fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(hint) = retry_after {
            return hint;
        }
        let delay = self.delay_for_attempt(attempt);
        if self.jitter {
            delay.mul_f64(rand::rng().random_range(0.5..=1.0))
        } else {
            delay
        }
    }
}

/// Decorator that wraps a [`GenerationProvider`] with retry logic.
///
/// Transient errors (as classified by
/// [`ShelftalkerError::is_transient()`]) are retried with exponential
/// backoff up to `config.max_attempts`, honouring provider
/// `retry_after` hints. Permanent errors return immediately.
pub struct RetryingProvider {
    inner: Arc<dyn GenerationProvider>,
    config: RetryConfig,
}

impl RetryingProvider {
    /// Wrap a provider with retry logic.
    pub fn new(inner: Arc<dyn GenerationProvider>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl GenerationProvider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        let mut last_err = None;
        for attempt in 0..self.config.max_attempts {
            match self.inner.complete(prompt, options).await {
                Ok(raw) => return Ok(raw),
                Err(e) if e.is_transient() => {
                    metrics::counter!(telemetry::RETRIES_TOTAL,
                        "provider" => self.inner.name().to_owned())
                    .increment(1);
                    if attempt + 1 < self.config.max_attempts {
                        let delay = self.config.effective_delay(attempt, e.retry_after());
                        warn!(
                            provider = self.inner.name(),
                            attempt = attempt + 1,
                            max_attempts = self.config.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "retrying after transient error"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_err = Some(e);
                }
                Err(e) => return Err(e), // permanent error, no retry
            }
        }
        Err(last_err.unwrap_or(ShelftalkerError::NoProvider))
    }
}
