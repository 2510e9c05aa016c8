//! Generation options.

use std::time::Duration;

/// Options for generation requests (provider-agnostic).
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    /// Model to use for generation.
    pub model: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum number of tokens to generate.
    pub max_tokens: usize,

    /// Upper bound on one provider call, including connection time.
    /// A timeout is treated identically to a provider failure.
    pub timeout: Duration,
}

impl GenerateOptions {
    /// Create options with the specified model and default sampling
    /// parameters (temperature 0.7, 2048 max tokens, 30s timeout).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: 0.7,
            max_tokens: 2048,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set max tokens.
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the per-call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
