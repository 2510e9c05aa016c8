//! Recommendation query, request, and response types.

use serde::{Deserialize, Serialize};

use super::quota::RateDecision;
use super::recommendation::BookRecommendation;

/// What kind of lookup a query is. Drives cache TTL selection: results
/// for a single-book similarity lookup stay valid for days, open-ended
/// searches go stale much sooner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Open-ended search ("cozy mysteries set in Venice").
    #[default]
    Search,
    /// Books similar to one named title.
    Similar,
}

/// Options accompanying a recommendation query.
///
/// Part of the cache key: two requests with equal normalized query text
/// and equal options map to the same cache entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    #[serde(default)]
    pub kind: QueryKind,
    /// How many recommendations to ask the provider for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    /// Restrict results to these genres.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: QueryKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn max_results(mut self, n: usize) -> Self {
        self.max_results = Some(n);
        self
    }

    pub fn genres(mut self, genres: Vec<String>) -> Self {
        self.genres = genres;
        self
    }
}

/// An inbound recommendation request.
#[derive(Debug, Clone)]
pub struct RecommendationRequest {
    /// Identity the rate limit is scoped to (IP or account id).
    pub identity: String,
    /// Account whose preference profile steers generation, when known.
    pub user_id: Option<String>,
    pub query: String,
    pub options: QueryOptions,
    /// Skip the cache check and force fresh generation. The existing
    /// cache entry for this key is overwritten on success.
    pub regenerate: bool,
}

impl RecommendationRequest {
    pub fn new(identity: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            user_id: None,
            query: query.into(),
            options: QueryOptions::default(),
            regenerate: false,
        }
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn regenerate(mut self, regenerate: bool) -> Self {
        self.regenerate = regenerate;
        self
    }
}

/// Where a response's recommendations came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Generated,
}

/// A successful recommendation response.
#[derive(Debug, Clone)]
pub struct RecommendationResponse {
    pub recommendations: Vec<BookRecommendation>,
    pub source: ResponseSource,
    /// Quota metadata for the caller to surface as response headers.
    pub quota: RateDecision,
}
