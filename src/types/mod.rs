//! Public types for the Shelftalker API.

mod feedback;
mod options;
mod profile;
mod query;
mod quota;
mod recommendation;

pub use feedback::{FeedbackEvent, FeedbackInput, LengthCategory};
pub use options::GenerateOptions;
pub use profile::{DimensionStats, PreferenceProfile};
pub use query::{
    QueryKind, QueryOptions, RecommendationRequest, RecommendationResponse, ResponseSource,
};
pub use quota::{EndpointClass, RateDecision, RateLimitConfig, RateWindow};
pub use recommendation::{
    BookRecommendation, PLACEHOLDER_IMAGE, RecommendationSet, UNKNOWN_AUTHOR, UNKNOWN_DATE,
    UNKNOWN_TITLE, dedup_key,
};
