//! Generation adapter.
//!
//! Bridges one configured [`GenerationProvider`] to the canonical
//! recommendation schema: bounds the call with a timeout, accounts for
//! it in metrics, and runs the shared parser over whatever came back.
//! Malformed output degrades to an empty list; only network/provider
//! failures (and timeouts, treated identically) surface, as
//! [`ShelftalkerError::Generation`] carrying the cause message.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::providers::{GenerationProvider, parse};
use crate::telemetry;
use crate::types::{GenerateOptions, RecommendationSet};
use crate::{Result, ShelftalkerError};

/// Uniform interface to the generation backend.
pub struct RecommendationAdapter {
    provider: Arc<dyn GenerationProvider>,
    options: GenerateOptions,
}

impl RecommendationAdapter {
    pub fn new(provider: Arc<dyn GenerationProvider>, options: GenerateOptions) -> Self {
        Self { provider, options }
    }

    /// Name of the underlying provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Generate and normalize recommendations for a prompt.
    ///
    /// Dropping the returned future cancels the in-flight provider
    /// call; an aborted request produces nothing to persist.
    pub async fn get_recommendations(&self, prompt: &str) -> Result<RecommendationSet> {
        let raw = self.complete_raw(prompt).await?;
        let recommendations = parse::parse_recommendations(&raw);
        debug!(
            provider = self.provider.name(),
            count = recommendations.len(),
            raw_len = raw.len(),
            "parsed provider output"
        );
        Ok(RecommendationSet {
            recommendations,
            raw,
        })
    }

    /// Run one timeout-bounded completion and return the raw text.
    /// Used directly by chat-style entry points, where the output is
    /// conversation rather than a record set.
    pub async fn complete_raw(&self, prompt: &str) -> Result<String> {
        let provider = self.provider.name().to_owned();
        let started = Instant::now();

        let outcome =
            tokio::time::timeout(self.options.timeout, self.provider.complete(prompt, &self.options))
                .await;

        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "provider" => provider.clone())
            .record(started.elapsed().as_secs_f64());

        let status = if matches!(outcome, Ok(Ok(_))) { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL,
            "provider" => provider, "status" => status)
        .increment(1);

        match outcome {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(e)) => Err(ShelftalkerError::Generation(e.to_string())),
            Err(_) => Err(ShelftalkerError::Generation(format!(
                "provider '{}' timed out after {:?}",
                self.provider.name(),
                self.options.timeout
            ))),
        }
    }
}
