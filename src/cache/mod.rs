//! Content-addressed recommendation cache.
//!
//! Caches full recommendation sets keyed by a deterministic digest of
//! the normalized query text plus a canonical serialization of the
//! query options, so logically identical requests always collide on one
//! entry. Entries carry their own `expires_at_ms` and are retired
//! lazily on read; no background sweeper runs and nothing is ever
//! explicitly invalidated.
//!
//! The key uses a sha-256 digest rather than an in-process hasher
//! because entries live in the shared store and must hash identically
//! across processes and restarts.
//!
//! # Failure policy
//!
//! Caching is an optimization, never a dependency: a failed read
//! degrades to a miss, a failed write is dropped with a `warn!`, and
//! neither outcome surfaces to the caller.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::clock::Clock;
use crate::store::{KeyValueStore, collections};
use crate::telemetry;
use crate::types::{BookRecommendation, QueryOptions};

/// One cached recommendation set. `expires_at_ms > created_at_ms`
/// always; the original query and options ride along for debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub query: String,
    pub options: QueryOptions,
    pub results: Vec<BookRecommendation>,
    pub created_at_ms: u64,
    pub expires_at_ms: u64,
}

/// TTL-based cache of recommendation sets over the shared store.
pub struct RecommendationCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl RecommendationCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Look up a cached result set.
    ///
    /// Returns `None` on miss, on an expired entry, and on any store or
    /// decode failure. Emits hit/miss metrics with the miss reason.
    pub async fn get(&self, key: &str) -> Option<Vec<BookRecommendation>> {
        let doc = match self.store.get(collections::CACHE_ENTRIES, key).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                miss("absent");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "cache read failed, treating as miss");
                miss("error");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_value(doc) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "cache entry undecodable, treating as miss");
                miss("error");
                return None;
            }
        };

        if entry.expires_at_ms <= self.clock.now_ms() {
            miss("expired");
            return None;
        }

        metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
        Some(entry.results)
    }

    /// Store a result set under `key` with the given TTL. Best-effort:
    /// a store failure drops the write and the request proceeds.
    pub async fn put(
        &self,
        key: &str,
        query: &str,
        options: &QueryOptions,
        results: &[BookRecommendation],
        ttl: Duration,
    ) {
        let now = self.clock.now_ms();
        let entry = CacheEntry {
            key: key.to_string(),
            query: query.to_string(),
            options: options.clone(),
            results: results.to_vec(),
            created_at_ms: now,
            expires_at_ms: now + ttl.as_millis() as u64,
        };

        let doc = match serde_json::to_value(&entry) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(key, error = %e, "cache entry unserializable, dropping write");
                return;
            }
        };

        if let Err(e) = self.store.put(collections::CACHE_ENTRIES, key, doc).await {
            metrics::counter!(telemetry::DROPPED_WRITES_TOTAL,
                "collection" => collections::CACHE_ENTRIES)
            .increment(1);
            warn!(key, error = %e, "cache write failed, dropping");
        }
    }
}

fn miss(reason: &'static str) {
    metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "reason" => reason).increment(1);
}

/// Compute the cache key for a query.
///
/// Lowercases and trims the query text, appends the canonical JSON of
/// the options (serde_json objects are sorted by key), and digests the
/// composite with sha-256 so equal logical queries always map to one
/// entry, across processes.
pub fn cache_key(query: &str, options: &QueryOptions) -> String {
    let canonical_options = serde_json::to_value(options)
        .map(|v| v.to_string())
        .unwrap_or_default();
    let composite = format!("{}\n{}", query.trim().to_lowercase(), canonical_options);
    let digest = Sha256::digest(composite.as_bytes());
    hex::encode(digest)
}
