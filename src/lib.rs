//! Shelftalker - personalized book-recommendation gateway
//!
//! This crate fronts an expensive, rate-limited text-generation backend
//! with three concerns: per-identity admission control, a
//! content-addressed TTL cache of recommendation sets, and an online
//! preference learner that turns like/dislike signals into per-user
//! taste probabilities used to steer generation.
//!
//! # Example
//!
//! ```rust,no_run
//! use shelftalker::{RecommendationRequest, Shelftalker};
//!
//! #[tokio::main]
//! async fn main() -> shelftalker::Result<()> {
//!     let gateway = Shelftalker::builder()
//!         .openai("sk-your-key")
//!         .build()?;
//!
//!     let response = gateway
//!         .recommend(
//!             &RecommendationRequest::new("203.0.113.7", "cozy mysteries set in Venice")
//!                 .user("user-42"),
//!         )
//!         .await?;
//!
//!     for book in &response.recommendations {
//!         println!("{} — {}", book.title, book.author);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Feedback Example
//!
//! ```rust,no_run
//! use shelftalker::{FeedbackInput, Shelftalker};
//!
//! # #[tokio::main]
//! # async fn main() -> shelftalker::Result<()> {
//! # let gateway = Shelftalker::builder().openai("sk-your-key").build()?;
//! let profile = gateway
//!     .submit_feedback(
//!         &FeedbackInput::new("203.0.113.7", "book-1", true)
//!             .user("user-42")
//!             .genres(vec!["Mystery".into()])
//!             .page_count(288),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod adapter;
pub mod cache;
pub mod clock;
pub mod error;
pub mod gateway;
pub mod limiter;
pub mod preferences;
pub mod providers;
pub mod store;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use adapter::RecommendationAdapter;
pub use cache::{RecommendationCache, cache_key};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, ShelftalkerError};
pub use gateway::{RecommendationGateway, Shelftalker, ShelftalkerBuilder};
pub use limiter::RateLimiter;
pub use preferences::PreferenceLearner;
pub use providers::{
    AnthropicProvider, GenerationProvider, OpenAiProvider, ProviderKind, RetryConfig,
    RetryingProvider, create_provider,
};
pub use store::{Document, KeyValueStore, MemoryStore, UpdateFn, collections};

// Re-export all types
pub use types::{
    BookRecommendation, DimensionStats, EndpointClass, FeedbackEvent, FeedbackInput,
    GenerateOptions, LengthCategory, PreferenceProfile, QueryKind, QueryOptions, RateDecision,
    RateLimitConfig, RateWindow, RecommendationRequest, RecommendationResponse, RecommendationSet,
    ResponseSource, dedup_key,
};
