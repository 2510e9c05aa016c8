//! Online preference learning.
//!
//! Converts discrete like/dislike signals into per-user taste
//! probabilities over genre, length, and mood dimensions. Each event
//! merges into the persisted profile through one atomic
//! [`KeyValueStore::update`], so concurrent feedback for the same user
//! never loses increments. There is no decay: probabilities are
//! cumulative for the life of the account.

use std::sync::Arc;

use tracing::warn;

use crate::clock::Clock;
use crate::store::{KeyValueStore, collections};
use crate::telemetry;
use crate::types::{FeedbackInput, PreferenceProfile};
use crate::{Result, ShelftalkerError};

/// Incremental per-user probability model.
pub struct PreferenceLearner {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl PreferenceLearner {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Fold one feedback event into the user's profile and return the
    /// updated profile.
    ///
    /// Personalization is best-effort at the system level: callers log
    /// a returned error and carry on rather than failing the request.
    pub async fn record_feedback(
        &self,
        user_id: &str,
        input: &FeedbackInput,
    ) -> Result<PreferenceProfile> {
        let now = self.clock.now_ms();
        let uid = user_id.to_string();
        let event = input.clone();

        let updated = self
            .store
            .update(
                collections::PROFILES,
                user_id,
                Box::new(move |current| {
                    let mut profile = current
                        .and_then(|doc| serde_json::from_value::<PreferenceProfile>(doc).ok())
                        .unwrap_or_else(|| PreferenceProfile::empty(uid));
                    profile.apply_feedback(&event, now);
                    serde_json::to_value(&profile).expect("preference profile serializes")
                }),
            )
            .await?;

        metrics::counter!(telemetry::FEEDBACK_TOTAL,
            "liked" => if input.liked { "true" } else { "false" })
        .increment(1);

        serde_json::from_value(updated).map_err(ShelftalkerError::Json)
    }

    /// The user's profile, or an empty one when they have no history.
    ///
    /// Never errors: a store failure or an undecodable document reads
    /// as no history, with a `warn!` for the operator.
    pub async fn profile(&self, user_id: &str) -> PreferenceProfile {
        match self.store.get(collections::PROFILES, user_id).await {
            Ok(Some(doc)) => serde_json::from_value(doc).unwrap_or_else(|e| {
                warn!(user_id, error = %e, "profile undecodable, treating as empty");
                PreferenceProfile::empty(user_id)
            }),
            Ok(None) => PreferenceProfile::empty(user_id),
            Err(e) => {
                warn!(user_id, error = %e, "profile read failed, treating as empty");
                PreferenceProfile::empty(user_id)
            }
        }
    }
}
