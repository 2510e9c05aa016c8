//! Canonical recommendation shape.

use serde::{Deserialize, Serialize};

/// Placeholder title for records the provider left untitled.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Placeholder author for records with no author.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Placeholder publication date.
pub const UNKNOWN_DATE: &str = "Unknown";

/// Default cover image path served when the provider supplies none.
pub const PLACEHOLDER_IMAGE: &str = "/images/book-placeholder.png";

/// One normalized book recommendation.
///
/// Every field has a defined default when absent from provider output:
/// numbers 0, arrays empty, strings an explicit placeholder, and `id`
/// generated (epoch-ms plus a random suffix; uniqueness is best-effort).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecommendation {
    pub id: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub publication_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub image_url: String,
}

impl BookRecommendation {
    /// Deduplication key: normalized `(title, author)`, stable across
    /// independent searches that surface the same book.
    pub fn dedup_key(&self) -> String {
        dedup_key(&self.title, &self.author)
    }
}

/// Normalized `(title, author)` key used by the durable book store.
pub fn dedup_key(title: &str, author: &str) -> String {
    format!(
        "{}::{}",
        title.trim().to_lowercase(),
        author.trim().to_lowercase()
    )
}

/// A parsed recommendation set, paired with the raw provider output it
/// was extracted from (kept for logging and debugging).
#[derive(Debug, Clone)]
pub struct RecommendationSet {
    pub recommendations: Vec<BookRecommendation>,
    pub raw: String,
}
