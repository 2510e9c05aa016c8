//! Per-identity admission control.
//!
//! Fixed-window counting over persisted [`RateWindow`] documents: the
//! first request in a window writes `count = 1`; later requests in the
//! same window increment until the configured maximum, after which the
//! check denies with `remaining = 0` until the window rolls over.
//! Rolled-over windows are superseded in place, never deleted.
//!
//! The whole check runs as one [`KeyValueStore::update`] call, so two
//! concurrent requests for the same identity cannot both observe
//! `count < max` and slip past the limit.
//!
//! # Failure policy
//!
//! If the store is unreachable the check **fails open**: the request is
//! admitted with a generous default quota, a `warn!` is emitted, and
//! [`RATE_FAIL_OPEN_TOTAL`](crate::telemetry::RATE_FAIL_OPEN_TOTAL)
//! increments. The lenient trade-off keeps an infra outage from
//! blocking all traffic; operators alerting on the metric can revisit
//! it per endpoint.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tracing::{debug, warn};

use crate::clock::Clock;
use crate::store::{KeyValueStore, collections};
use crate::telemetry;
use crate::types::{EndpointClass, RateDecision, RateWindow};
use crate::{Result, ShelftalkerError};

/// Fixed-window rate limiter over a persisted counter document.
pub struct RateLimiter {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Check (and count) one request for `identity` against the
    /// endpoint's window. Always returns a decision; store failures
    /// fail open.
    pub async fn check(
        &self,
        identity: &str,
        endpoint: EndpointClass,
        max_requests: u32,
        window: Duration,
    ) -> RateDecision {
        let now = self.clock.now_ms();
        let window_ms = window.as_millis() as u64;
        let key = window_key(identity, endpoint);

        let slot: Arc<OnceLock<RateDecision>> = Arc::new(OnceLock::new());
        let decision_slot = Arc::clone(&slot);
        let identity_owned = identity.to_string();

        let outcome = self
            .store
            .update(
                collections::RATE_WINDOWS,
                &key,
                Box::new(move |current| {
                    let current = current.and_then(|doc| {
                        serde_json::from_value::<RateWindow>(doc).ok()
                    });

                    let (next, allowed) = match current {
                        Some(w) if now.saturating_sub(w.window_start_ms) < window_ms => {
                            if w.count < max_requests {
                                (
                                    RateWindow {
                                        count: w.count + 1,
                                        last_request_ms: now,
                                        ..w
                                    },
                                    true,
                                )
                            } else {
                                (
                                    RateWindow {
                                        last_request_ms: now,
                                        ..w
                                    },
                                    false,
                                )
                            }
                        }
                        // Absent, corrupt, or rolled over: fresh window.
                        _ => (
                            RateWindow {
                                identity: identity_owned,
                                endpoint: endpoint.as_str().to_string(),
                                count: 1,
                                window_start_ms: now,
                                last_request_ms: now,
                            },
                            true,
                        ),
                    };

                    let decision = RateDecision {
                        allowed,
                        limit: max_requests,
                        remaining: if allowed {
                            max_requests.saturating_sub(next.count)
                        } else {
                            0
                        },
                        reset_at_ms: next.window_start_ms + window_ms,
                    };
                    let _ = decision_slot.set(decision);

                    serde_json::to_value(&next).expect("rate window serializes")
                }),
            )
            .await;

        match outcome {
            Ok(_) => {
                let decision = slot.get().copied().unwrap_or(RateDecision {
                    allowed: true,
                    limit: max_requests,
                    remaining: max_requests.saturating_sub(1),
                    reset_at_ms: now + window_ms,
                });
                if !decision.allowed {
                    metrics::counter!(telemetry::RATE_DENIALS_TOTAL,
                        "endpoint" => endpoint.as_str())
                    .increment(1);
                    debug!(
                        identity,
                        endpoint = endpoint.as_str(),
                        reset_at_ms = decision.reset_at_ms,
                        "request denied by rate limit"
                    );
                }
                decision
            }
            Err(e) => {
                metrics::counter!(telemetry::RATE_FAIL_OPEN_TOTAL,
                    "endpoint" => endpoint.as_str())
                .increment(1);
                warn!(
                    identity,
                    endpoint = endpoint.as_str(),
                    error = %e,
                    "rate limit store unreachable, failing open"
                );
                RateDecision {
                    allowed: true,
                    limit: max_requests,
                    remaining: max_requests.saturating_sub(1),
                    reset_at_ms: now + window_ms,
                }
            }
        }
    }

    /// Administrative override: reinitialize the identity's window
    /// immediately. The next request starts a full quota.
    pub async fn reset(&self, identity: &str, endpoint: EndpointClass) -> Result<()> {
        let now = self.clock.now_ms();
        let window = RateWindow {
            identity: identity.to_string(),
            endpoint: endpoint.as_str().to_string(),
            count: 0,
            window_start_ms: now,
            last_request_ms: now,
        };
        self.store
            .put(
                collections::RATE_WINDOWS,
                &window_key(identity, endpoint),
                serde_json::to_value(&window).map_err(ShelftalkerError::Json)?,
            )
            .await
    }
}

fn window_key(identity: &str, endpoint: EndpointClass) -> String {
    format!("{identity}:{}", endpoint.as_str())
}
