//! Gateway: builder and request orchestration.

mod builder;
mod engine;

pub use builder::{Shelftalker, ShelftalkerBuilder};
pub use engine::RecommendationGateway;
