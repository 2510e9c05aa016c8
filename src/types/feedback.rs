//! Feedback types.

use serde::{Deserialize, Serialize};

/// Page-count buckets for the length preference dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthCategory {
    Short,
    Medium,
    Long,
}

impl LengthCategory {
    /// Bucket a page count: under 300 short, under 500 medium, else long.
    pub fn from_page_count(pages: u32) -> Self {
        if pages < 300 {
            Self::Short
        } else if pages < 500 {
            Self::Medium
        } else {
            Self::Long
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

/// A like/dislike submission.
///
/// The caller holds the recommendation being rated, so the taste
/// dimensions travel with the submission; nothing is re-read from the
/// book store on the feedback path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackInput {
    /// Identity the feedback rate limit is scoped to.
    pub identity: String,
    /// Account whose profile the event updates; anonymous feedback is
    /// logged but trains nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub book_id: String,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Page count of the rated book, when known. Unknown page count
    /// leaves the length dimension untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moods: Vec<String>,
    pub liked: bool,
}

impl FeedbackInput {
    pub fn new(identity: impl Into<String>, book_id: impl Into<String>, liked: bool) -> Self {
        Self {
            identity: identity.into(),
            user_id: None,
            book_id: book_id.into(),
            genres: Vec::new(),
            page_count: None,
            moods: Vec::new(),
            liked,
        }
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn genres(mut self, genres: Vec<String>) -> Self {
        self.genres = genres;
        self
    }

    pub fn page_count(mut self, pages: u32) -> Self {
        self.page_count = Some(pages);
        self
    }

    pub fn moods(mut self, moods: Vec<String>) -> Self {
        self.moods = moods;
        self
    }

    /// Length bucket for this event, if the page count is known.
    pub fn length_category(&self) -> Option<LengthCategory> {
        self.page_count.map(LengthCategory::from_page_count)
    }
}

/// The raw event appended (write-once) to the feedback log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub book_id: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<LengthCategory>,
    pub liked: bool,
    pub timestamp_ms: u64,
}
