//! Provider trait for text-generation backends.

use async_trait::async_trait;

use crate::Result;
use crate::types::GenerateOptions;

/// A text-generation backend.
///
/// Implementations own one provider's wire format and nothing else:
/// they return the model's raw text and raise only for network or
/// provider-level failures. Interpreting that text into recommendation
/// records is the adapter's job, shared across all providers.
///
/// Decorators ([`RetryingProvider`](super::RetryingProvider)) wrap the
/// trait object to layer behaviour without touching implementations.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Run one completion and return the raw model output.
    async fn complete(&self, prompt: &str, options: &GenerateOptions) -> Result<String>;
}
