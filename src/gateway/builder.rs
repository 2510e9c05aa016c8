//! Builder for configuring gateway instances.

use std::sync::Arc;
use std::time::Duration;

use super::engine::{GatewayConfig, RecommendationGateway};
use crate::adapter::RecommendationAdapter;
use crate::clock::{Clock, SystemClock};
use crate::providers::{
    GenerationProvider, ProviderKind, RetryConfig, RetryingProvider, create_provider,
};
use crate::store::{KeyValueStore, MemoryStore};
use crate::types::{GenerateOptions, RateLimitConfig};
use crate::{Result, ShelftalkerError};

/// Main entry point for creating gateway instances.
pub struct Shelftalker;

impl Shelftalker {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> ShelftalkerBuilder {
        ShelftalkerBuilder::new()
    }
}

/// Builder for configuring gateway instances.
pub struct ShelftalkerBuilder {
    openai_key: Option<String>,
    anthropic_key: Option<String>,
    provider_kind: Option<ProviderKind>,
    base_url: Option<String>,
    custom_provider: Option<Arc<dyn GenerationProvider>>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    timeout: Option<Duration>,
    retry: Option<RetryConfig>,
    store: Option<Arc<dyn KeyValueStore>>,
    clock: Option<Arc<dyn Clock>>,
    search_limit: RateLimitConfig,
    feedback_limit: RateLimitConfig,
    search_ttl: Duration,
    similar_ttl: Duration,
}

impl ShelftalkerBuilder {
    pub fn new() -> Self {
        Self {
            openai_key: None,
            anthropic_key: None,
            provider_kind: None,
            base_url: None,
            custom_provider: None,
            model: None,
            temperature: None,
            max_tokens: None,
            timeout: None,
            retry: None,
            store: None,
            clock: None,
            search_limit: RateLimitConfig::default(),
            feedback_limit: RateLimitConfig::new(60, Duration::from_secs(60)),
            search_ttl: Duration::from_secs(12 * 60 * 60),
            similar_ttl: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }

    /// Configure the OpenAI provider.
    pub fn openai(mut self, api_key: impl Into<String>) -> Self {
        self.openai_key = Some(api_key.into());
        self
    }

    /// Configure the Anthropic provider.
    pub fn anthropic(mut self, api_key: impl Into<String>) -> Self {
        self.anthropic_key = Some(api_key.into());
        self
    }

    /// Pick which configured backend serves generation. Only needed
    /// when more than one key is configured.
    pub fn provider_kind(mut self, kind: ProviderKind) -> Self {
        self.provider_kind = Some(kind);
        self
    }

    /// Override the provider base URL (for testing with wiremock).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Inject a custom provider implementation, bypassing the factory.
    pub fn provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.custom_provider = Some(provider);
        self
    }

    /// Set the generation model (defaults per provider kind).
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature (default 0.7).
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the generation token budget (default 2048).
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the per-call generation timeout (default 30s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable retry on transient provider errors.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    /// Use a custom store backend (default: in-memory).
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use a custom clock (tests).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Admission limit for recommendation queries (default 30/min).
    pub fn search_limit(mut self, config: RateLimitConfig) -> Self {
        self.search_limit = config;
        self
    }

    /// Admission limit for feedback submissions (default 60/min).
    pub fn feedback_limit(mut self, config: RateLimitConfig) -> Self {
        self.feedback_limit = config;
        self
    }

    /// Cache TTL for open-ended searches (default 12h).
    pub fn search_ttl(mut self, ttl: Duration) -> Self {
        self.search_ttl = ttl;
        self
    }

    /// Cache TTL for single-book similarity lookups (default 7 days).
    pub fn similar_ttl(mut self, ttl: Duration) -> Self {
        self.similar_ttl = ttl;
        self
    }

    /// Resolve the configured provider: an injected implementation
    /// wins; otherwise the factory builds from the selected (or only)
    /// configured backend.
    fn resolve_provider(&self) -> Result<(Arc<dyn GenerationProvider>, ProviderKind)> {
        if let Some(provider) = &self.custom_provider {
            let kind = self.provider_kind.unwrap_or(ProviderKind::OpenAi);
            return Ok((Arc::clone(provider), kind));
        }

        let kind = match (self.provider_kind, &self.openai_key, &self.anthropic_key) {
            (Some(kind), _, _) => kind,
            (None, Some(_), None) => ProviderKind::OpenAi,
            (None, None, Some(_)) => ProviderKind::Anthropic,
            (None, Some(_), Some(_)) => {
                return Err(ShelftalkerError::Configuration(
                    "multiple providers configured; call provider_kind() to pick one".to_string(),
                ));
            }
            (None, None, None) => return Err(ShelftalkerError::NoProvider),
        };

        let key = match kind {
            ProviderKind::OpenAi => self.openai_key.as_deref(),
            ProviderKind::Anthropic => self.anthropic_key.as_deref(),
        }
        .ok_or(ShelftalkerError::NoProvider)?;

        Ok((create_provider(kind, key, self.base_url.as_deref()), kind))
    }

    /// Build the gateway.
    pub fn build(self) -> Result<RecommendationGateway> {
        let (provider, kind) = self.resolve_provider()?;
        let provider = match &self.retry {
            Some(config) => Arc::new(RetryingProvider::new(provider, config.clone()))
                as Arc<dyn GenerationProvider>,
            None => provider,
        };

        let mut options =
            GenerateOptions::new(self.model.unwrap_or_else(|| kind.default_model().to_string()));
        if let Some(temperature) = self.temperature {
            options = options.temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            options = options.max_tokens(max_tokens);
        }
        if let Some(timeout) = self.timeout {
            options = options.timeout(timeout);
        }

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new()) as Arc<dyn KeyValueStore>);
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        Ok(RecommendationGateway::new(
            RecommendationAdapter::new(provider, options),
            store,
            clock,
            GatewayConfig {
                search_limit: self.search_limit,
                feedback_limit: self.feedback_limit,
                search_ttl: self.search_ttl,
                similar_ttl: self.similar_ttl,
            },
        ))
    }
}

impl Default for ShelftalkerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
