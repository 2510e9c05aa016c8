//! Generation providers.
//!
//! One implementation per backend, all behind [`GenerationProvider`].
//! The factory selects a backend from [`ProviderKind`]; the shared
//! parsing/normalization in [`parse`] means implementations only speak
//! their wire format.

pub mod parse;

mod anthropic;
mod openai;
mod retry;
mod traits;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;
pub use retry::{RetryConfig, RetryingProvider};
pub use traits::GenerationProvider;

use std::sync::Arc;
use std::time::Duration;

use crate::{Result, ShelftalkerError};

/// Which generation backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Model used when the builder is not given one explicitly.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-haiku-latest",
        }
    }
}

/// Map a non-success status to the matching error. 429 carries the
/// `Retry-After` hint so the retry layer can honour it.
pub(crate) fn check_status(response: &reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    if status.as_u16() == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(ShelftalkerError::RateLimited { retry_after });
    }
    Err(ShelftalkerError::Api {
        status: status.as_u16(),
        message: status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
    })
}

/// Build the provider for a configured backend.
pub fn create_provider(
    kind: ProviderKind,
    api_key: impl Into<String>,
    base_url: Option<&str>,
) -> Arc<dyn GenerationProvider> {
    match (kind, base_url) {
        (ProviderKind::OpenAi, Some(url)) => Arc::new(OpenAiProvider::with_base_url(api_key, url)),
        (ProviderKind::OpenAi, None) => Arc::new(OpenAiProvider::new(api_key)),
        (ProviderKind::Anthropic, Some(url)) => {
            Arc::new(AnthropicProvider::with_base_url(api_key, url))
        }
        (ProviderKind::Anthropic, None) => Arc::new(AnthropicProvider::new(api_key)),
    }
}
