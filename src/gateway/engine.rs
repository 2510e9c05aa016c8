//! Request orchestration.
//!
//! Composes admission control, the response cache, the generation
//! adapter, and the preference learner into the request lifecycle:
//!
//! ```text
//! recommend:  rate check ── denied ──► RateLimitExceeded
//!                │ allowed
//!                ▼
//!            cache check ── hit ──► respond (source: cache)
//!                │ miss (or regenerate)
//!                ▼
//!             generate ── failure ──► Generation error
//!                │ success
//!                ▼
//!         persist + cache (best-effort) ──► respond (source: generated)
//!
//! feedback:  validate ──► rate check ──► learner update (best-effort)
//!                                    ──► event log (best-effort)
//! ```
//!
//! Handlers are stateless; every piece of durable state lives behind
//! [`KeyValueStore`]. Dropping a `recommend` future cancels the
//! in-flight generation call, and an aborted request never reaches the
//! persist step.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::adapter::RecommendationAdapter;
use crate::cache::{RecommendationCache, cache_key};
use crate::clock::Clock;
use crate::limiter::RateLimiter;
use crate::preferences::PreferenceLearner;
use crate::store::{Document, KeyValueStore, collections};
use crate::telemetry;
use crate::types::{
    BookRecommendation, EndpointClass, FeedbackEvent, FeedbackInput, PreferenceProfile, QueryKind,
    RateLimitConfig, RecommendationRequest, RecommendationResponse, ResponseSource, dedup_key,
};
use crate::{Result, ShelftalkerError};

/// How many recommendations to ask for when the query doesn't say.
const DEFAULT_MAX_RESULTS: usize = 5;

/// Gateway tunables fixed at build time.
pub(crate) struct GatewayConfig {
    pub search_limit: RateLimitConfig,
    pub feedback_limit: RateLimitConfig,
    pub search_ttl: Duration,
    pub similar_ttl: Duration,
}

/// The orchestrator: one instance serves all requests concurrently.
pub struct RecommendationGateway {
    adapter: RecommendationAdapter,
    limiter: RateLimiter,
    cache: RecommendationCache,
    learner: PreferenceLearner,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: GatewayConfig,
}

impl RecommendationGateway {
    pub(crate) fn new(
        adapter: RecommendationAdapter,
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            adapter,
            limiter: RateLimiter::new(Arc::clone(&store), Arc::clone(&clock)),
            cache: RecommendationCache::new(Arc::clone(&store), Arc::clone(&clock)),
            learner: PreferenceLearner::new(Arc::clone(&store), Arc::clone(&clock)),
            store,
            clock,
            config,
        }
    }

    /// Serve one recommendation query.
    ///
    /// Errors: [`ShelftalkerError::InvalidInput`] for an empty query,
    /// [`ShelftalkerError::RateLimitExceeded`] with quota metadata when
    /// admission denies, [`ShelftalkerError::Generation`] when the
    /// provider fails and there is no cached result to serve.
    #[instrument(skip_all, fields(identity = %request.identity, regenerate = request.regenerate))]
    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationResponse> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(ShelftalkerError::InvalidInput(
                "query must not be empty".to_string(),
            ));
        }

        let quota = self
            .limiter
            .check(
                &request.identity,
                EndpointClass::Search,
                self.config.search_limit.max_requests,
                self.config.search_limit.window,
            )
            .await;
        if !quota.allowed {
            return Err(ShelftalkerError::RateLimitExceeded {
                limit: quota.limit,
                remaining: quota.remaining,
                reset_at_ms: quota.reset_at_ms,
            });
        }

        let key = cache_key(query, &request.options);

        // A regenerate request leaves any existing entry untouched here;
        // the fresh result overwrites it below.
        if !request.regenerate
            && let Some(recommendations) = self.cache.get(&key).await
        {
            debug!(key, "serving cached recommendations");
            return Ok(RecommendationResponse {
                recommendations,
                source: ResponseSource::Cache,
                quota,
            });
        }

        let prompt = self.build_prompt(request).await;
        let set = self.adapter.get_recommendations(&prompt).await?;

        self.persist_and_cache(&key, query, request, &set.recommendations)
            .await;

        Ok(RecommendationResponse {
            recommendations: set.recommendations,
            source: ResponseSource::Generated,
            quota,
        })
    }

    /// Accept one like/dislike submission.
    ///
    /// Returns the updated profile, or `None` when the submission was
    /// anonymous or the profile write had to be dropped (store outage).
    /// Only validation and admission produce errors.
    #[instrument(skip_all, fields(identity = %input.identity, liked = input.liked))]
    pub async fn submit_feedback(
        &self,
        input: &FeedbackInput,
    ) -> Result<Option<PreferenceProfile>> {
        if input.book_id.trim().is_empty() {
            return Err(ShelftalkerError::InvalidInput(
                "book_id must not be empty".to_string(),
            ));
        }

        let quota = self
            .limiter
            .check(
                &input.identity,
                EndpointClass::Feedback,
                self.config.feedback_limit.max_requests,
                self.config.feedback_limit.window,
            )
            .await;
        if !quota.allowed {
            return Err(ShelftalkerError::RateLimitExceeded {
                limit: quota.limit,
                remaining: quota.remaining,
                reset_at_ms: quota.reset_at_ms,
            });
        }

        let profile = match &input.user_id {
            Some(user_id) => match self.learner.record_feedback(user_id, input).await {
                Ok(profile) => Some(profile),
                Err(e) => {
                    metrics::counter!(telemetry::DROPPED_WRITES_TOTAL,
                        "collection" => collections::PROFILES)
                    .increment(1);
                    warn!(user_id = %user_id, error = %e, "preference update dropped");
                    None
                }
            },
            None => None,
        };

        self.log_feedback(input).await;

        Ok(profile)
    }

    /// Chat-style entry point: admission-checked passthrough to the
    /// generation backend, steered by the user's taste hints. Chat
    /// output is conversational, so it is neither parsed nor cached.
    pub async fn chat(&self, identity: &str, user_id: Option<&str>, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(ShelftalkerError::InvalidInput(
                "prompt must not be empty".to_string(),
            ));
        }

        let quota = self
            .limiter
            .check(
                identity,
                EndpointClass::Chat,
                self.config.search_limit.max_requests,
                self.config.search_limit.window,
            )
            .await;
        if !quota.allowed {
            return Err(ShelftalkerError::RateLimitExceeded {
                limit: quota.limit,
                remaining: quota.remaining,
                reset_at_ms: quota.reset_at_ms,
            });
        }

        let mut full_prompt = prompt.trim().to_string();
        if let Some(user_id) = user_id {
            let profile = self.learner.profile(user_id).await;
            if let Some(hints) = profile.prompt_hints() {
                full_prompt.push(' ');
                full_prompt.push_str(&hints);
            }
        }

        self.adapter.complete_raw(&full_prompt).await
    }

    /// The user's current preference profile (empty when unknown).
    pub async fn profile(&self, user_id: &str) -> PreferenceProfile {
        self.learner.profile(user_id).await
    }

    /// Administrative rate-limit override for an identity.
    pub async fn reset_rate_limit(&self, identity: &str, endpoint: EndpointClass) -> Result<()> {
        self.limiter.reset(identity, endpoint).await
    }

    /// Compose the generation prompt: the query, any genre constraint,
    /// the user's taste hints, and the output-shape instruction.
    async fn build_prompt(&self, request: &RecommendationRequest) -> String {
        let n = request.options.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        let mut prompt = match request.options.kind {
            QueryKind::Similar => format!(
                "Recommend {n} books similar to {}.",
                request.query.trim()
            ),
            QueryKind::Search => format!(
                "Recommend {n} books matching this request: {}.",
                request.query.trim()
            ),
        };

        if !request.options.genres.is_empty() {
            prompt.push_str(&format!(
                " Only include books in these genres: {}.",
                request.options.genres.join(", ")
            ));
        }

        if let Some(user_id) = &request.user_id {
            let profile = self.learner.profile(user_id).await;
            if let Some(hints) = profile.prompt_hints() {
                prompt.push(' ');
                prompt.push_str(&hints);
            }
        }

        prompt.push_str(
            " Respond with a JSON array of objects with fields: \
             title, author, description, genres, publicationDate, \
             rating, pageCount.",
        );
        prompt
    }

    /// PERSIST_AND_CACHE: upsert each book into the dedup store, append
    /// the search log entry, and cache the result set. All three are
    /// best-effort; a failure is logged and counted, never propagated.
    async fn persist_and_cache(
        &self,
        key: &str,
        query: &str,
        request: &RecommendationRequest,
        recommendations: &[BookRecommendation],
    ) {
        for book in recommendations {
            self.upsert_book(book).await;
        }

        self.log_search(key, query, request, recommendations.len())
            .await;

        let ttl = match request.options.kind {
            QueryKind::Similar => self.config.similar_ttl,
            QueryKind::Search => self.config.search_ttl,
        };
        self.cache
            .put(key, query, &request.options, recommendations, ttl)
            .await;
    }

    /// Upsert one book keyed by normalized (title, author). An existing
    /// record keeps its id and first-seen timestamp; fields the new
    /// sighting actually knows (non-zero, non-empty) overwrite.
    async fn upsert_book(&self, book: &BookRecommendation) {
        let now = self.clock.now_ms();
        let incoming = book.clone();
        let outcome = self
            .store
            .update(
                collections::BOOKS,
                &dedup_key(&book.title, &book.author),
                Box::new(move |current| merge_book(current, incoming, now)),
            )
            .await;
        if let Err(e) = outcome {
            metrics::counter!(telemetry::DROPPED_WRITES_TOTAL,
                "collection" => collections::BOOKS)
            .increment(1);
            warn!(title = %book.title, error = %e, "book upsert dropped");
        }
    }

    async fn log_search(
        &self,
        key: &str,
        query: &str,
        request: &RecommendationRequest,
        result_count: usize,
    ) {
        let now = self.clock.now_ms();
        let log_key = format!("{now}-{}", &key[..12.min(key.len())]);
        let entry = serde_json::json!({
            "query": query,
            "options": request.options,
            "identity": request.identity,
            "userId": request.user_id,
            "resultCount": result_count,
            "createdAtMs": now,
        });
        if let Err(e) = self
            .store
            .put(collections::SEARCH_LOG, &log_key, entry)
            .await
        {
            metrics::counter!(telemetry::DROPPED_WRITES_TOTAL,
                "collection" => collections::SEARCH_LOG)
            .increment(1);
            warn!(error = %e, "search log write dropped");
        }
    }

    async fn log_feedback(&self, input: &FeedbackInput) {
        let now = self.clock.now_ms();
        let event = FeedbackEvent {
            user_id: input.user_id.clone(),
            book_id: input.book_id.clone(),
            genres: input.genres.clone(),
            length: input.length_category(),
            liked: input.liked,
            timestamp_ms: now,
        };
        let log_key = format!("{now}-{}", input.book_id);
        let doc = match serde_json::to_value(&event) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "feedback event unserializable, dropping");
                return;
            }
        };
        if let Err(e) = self.store.put(collections::FEEDBACK_LOG, &log_key, doc).await {
            metrics::counter!(telemetry::DROPPED_WRITES_TOTAL,
                "collection" => collections::FEEDBACK_LOG)
            .increment(1);
            warn!(error = %e, "feedback log write dropped");
        }
    }
}

/// Merge a fresh sighting of a book into its stored record. An
/// existing record keeps its id and first-seen timestamp; fields only
/// the new sighting knows fill in the blanks.
fn merge_book(current: Option<Document>, incoming: BookRecommendation, now: u64) -> Document {
    let first_seen = current
        .as_ref()
        .and_then(|doc| doc.get("firstSeenMs"))
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(now);

    let merged = match current.and_then(|doc| serde_json::from_value::<BookRecommendation>(doc).ok())
    {
        Some(mut existing) => {
            if existing.description.is_empty() {
                existing.description = incoming.description;
            }
            if existing.genres.is_empty() {
                existing.genres = incoming.genres;
            }
            if existing.page_count == 0 {
                existing.page_count = incoming.page_count;
            }
            if existing.rating == 0.0 {
                existing.rating = incoming.rating;
            }
            existing
        }
        None => incoming,
    };

    let mut doc = serde_json::to_value(&merged).unwrap_or(Document::Null);
    if let Some(map) = doc.as_object_mut() {
        map.insert("firstSeenMs".to_string(), serde_json::json!(first_seen));
        map.insert("lastSeenMs".to_string(), serde_json::json!(now));
    }
    doc
}
