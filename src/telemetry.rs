//! Telemetry metric name constants.
//!
//! Centralised metric names for shelftalker operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `shelftalker_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider` — generation provider name (e.g. "openai", "anthropic")
//! - `operation` — entry point invoked (e.g. "recommend", "feedback")
//! - `status` — outcome: "ok" or "error"
//! - `endpoint` — admission endpoint class ("search" | "chat" | "feedback")
//! - `collection` — logical store collection a write targeted

/// Total generation requests dispatched to a provider.
///
/// Labels: `provider`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "shelftalker_requests_total";

/// Generation request duration in seconds.
///
/// Labels: `provider`.
pub const REQUEST_DURATION_SECONDS: &str = "shelftalker_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "shelftalker_retries_total";

/// Total recommendation cache hits.
pub const CACHE_HITS_TOTAL: &str = "shelftalker_cache_hits_total";

/// Total recommendation cache misses.
///
/// Labels: `reason` ("absent" | "expired" | "error").
pub const CACHE_MISSES_TOTAL: &str = "shelftalker_cache_misses_total";

/// Total requests denied by admission control.
///
/// Labels: `endpoint`.
pub const RATE_DENIALS_TOTAL: &str = "shelftalker_rate_denials_total";

/// Total admission checks that failed open because the store was
/// unreachable. A non-zero rate here means quota is not being enforced.
///
/// Labels: `endpoint`.
pub const RATE_FAIL_OPEN_TOTAL: &str = "shelftalker_rate_fail_open_total";

/// Which parsing branch produced a recommendation set.
///
/// Labels: `branch` ("json" | "fragment" | "lines" | "empty").
pub const PARSE_BRANCH_TOTAL: &str = "shelftalker_parse_branch_total";

/// Total feedback events recorded by the preference learner.
///
/// Labels: `liked` ("true" | "false").
pub const FEEDBACK_TOTAL: &str = "shelftalker_feedback_total";

/// Total best-effort writes that were dropped because the store failed.
///
/// Labels: `collection`.
pub const DROPPED_WRITES_TOTAL: &str = "shelftalker_dropped_writes_total";
