//! Preference profile types.
//!
//! A profile is a cumulative tally of like/dislike signals per taste
//! dimension (genre, length bucket, mood). There is no decay or
//! time-weighting: decade-old feedback counts the same as yesterday's.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::feedback::FeedbackInput;

/// Minimum observations before a dimension is trusted for steering.
const MIN_STEERING_COUNT: u32 = 2;

/// Probability threshold above which a dimension counts as preferred.
const STEERING_THRESHOLD: f64 = 0.5;

/// How many top genres feed generation hints.
const TOP_GENRES: usize = 3;

/// Per-dimension tally. `probability == likes / count` after every
/// update; `likes <= count` by construction, so it stays in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionStats {
    pub count: u32,
    pub likes: u32,
    pub probability: f64,
}

impl DimensionStats {
    /// Fold one observation into the tally.
    pub fn record(&mut self, liked: bool) {
        self.count += 1;
        if liked {
            self.likes += 1;
        }
        self.probability = f64::from(self.likes) / f64::from(self.count);
    }
}

/// A user's cumulative taste profile.
///
/// Created lazily on the first feedback event and kept for the lifetime
/// of the account. Maps are `BTreeMap` so the persisted document is
/// canonical regardless of event order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceProfile {
    pub user_id: String,
    #[serde(default)]
    pub genre_preferences: BTreeMap<String, DimensionStats>,
    /// Keyed by length bucket name ("short" | "medium" | "long").
    #[serde(default)]
    pub length_preferences: BTreeMap<String, DimensionStats>,
    #[serde(default)]
    pub mood_preferences: BTreeMap<String, DimensionStats>,
    /// Liked genres, deduplicated, in first-liked order.
    #[serde(default)]
    pub favorite_genres: Vec<String>,
    #[serde(default)]
    pub updated_at_ms: u64,
}

impl PreferenceProfile {
    /// An empty profile for a user with no history. Never `None`, never
    /// an error: absence of taste data is a valid profile.
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Fold one feedback event into the profile.
    ///
    /// Each touched dimension value gets `count += 1`, `likes += liked`,
    /// `probability = likes / count`. Genres repeated within one event
    /// are counted once. Liked genres are unioned into
    /// `favorite_genres` without duplicates.
    pub fn apply_feedback(&mut self, input: &FeedbackInput, now_ms: u64) {
        let mut seen = Vec::new();
        for genre in &input.genres {
            let label = genre.trim();
            if label.is_empty() || seen.iter().any(|s: &String| s.eq_ignore_ascii_case(label)) {
                continue;
            }
            seen.push(label.to_string());
            self.genre_preferences
                .entry(label.to_string())
                .or_default()
                .record(input.liked);
            if input.liked && !self.favorite_genres.iter().any(|g| g == label) {
                self.favorite_genres.push(label.to_string());
            }
        }

        if let Some(length) = input.length_category() {
            self.length_preferences
                .entry(length.as_str().to_string())
                .or_default()
                .record(input.liked);
        }

        for mood in &input.moods {
            let label = mood.trim();
            if label.is_empty() {
                continue;
            }
            self.mood_preferences
                .entry(label.to_string())
                .or_default()
                .record(input.liked);
        }

        self.updated_at_ms = now_ms;
    }

    /// Like probability for a genre, if the user has any history for it.
    pub fn genre_probability(&self, genre: &str) -> Option<f64> {
        self.genre_preferences.get(genre).map(|s| s.probability)
    }

    /// Top liked genres, by probability then label, restricted to
    /// dimensions with enough observations to trust.
    pub fn preferred_genres(&self) -> Vec<&str> {
        let mut ranked: Vec<(&str, &DimensionStats)> = self
            .genre_preferences
            .iter()
            .filter(|(_, s)| s.count >= MIN_STEERING_COUNT && s.probability > STEERING_THRESHOLD)
            .map(|(label, stats)| (label.as_str(), stats))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.probability
                .total_cmp(&a.1.probability)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked.into_iter().take(TOP_GENRES).map(|(g, _)| g).collect()
    }

    /// The length bucket this user most reliably likes, if any.
    pub fn preferred_length(&self) -> Option<&str> {
        self.length_preferences
            .iter()
            .filter(|(_, s)| s.count >= MIN_STEERING_COUNT && s.probability > STEERING_THRESHOLD)
            .max_by(|a, b| a.1.probability.total_cmp(&b.1.probability))
            .map(|(label, _)| label.as_str())
    }

    /// Natural-language steering hint for generation prompts, or `None`
    /// when the profile has nothing trustworthy to say yet.
    pub fn prompt_hints(&self) -> Option<String> {
        let genres = self.preferred_genres();
        let length = self.preferred_length();
        if genres.is_empty() && length.is_none() {
            return None;
        }

        let mut hint = String::from("The reader");
        if !genres.is_empty() {
            hint.push_str(&format!(" particularly enjoys {}", genres.join(", ")));
        }
        if let Some(length) = length {
            if !genres.is_empty() {
                hint.push_str(" and");
            }
            hint.push_str(&format!(" prefers {length} books"));
        }
        hint.push('.');
        Some(hint)
    }

    pub fn is_empty(&self) -> bool {
        self.genre_preferences.is_empty()
            && self.length_preferences.is_empty()
            && self.mood_preferences.is_empty()
    }
}
