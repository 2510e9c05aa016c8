//! Durable state access.
//!
//! All four stateful components (rate windows, cache entries, book
//! dedup records, preference profiles) and the write-once logs require
//! only key/value document semantics against named logical collections.
//! [`KeyValueStore`] is that contract; the concrete storage technology
//! is the embedding application's choice. [`MemoryStore`] ships
//! in-crate as the embedded/test backend.
//!
//! # Atomicity
//!
//! [`KeyValueStore::update`] is the single read-modify-write primitive.
//! Implementations must apply the closure atomically per key (via a
//! transactional update or an optimistic compare-and-retry loop), so
//! that concurrent rate-window increments and preference-profile merges
//! never lose updates. No cross-key or cross-collection transaction is
//! required.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::Result;

/// A stored document. Plain JSON keeps the contract portable across
/// backends with document, wide-column, or plain KV semantics.
pub type Document = serde_json::Value;

/// Closure applied atomically by [`KeyValueStore::update`]. Receives the
/// current document (if any) and returns the replacement.
pub type UpdateFn = Box<dyn FnOnce(Option<Document>) -> Document + Send>;

/// Names of the logical collections this crate reads and writes.
pub mod collections {
    /// Fixed-window admission counters, keyed `identity:endpoint`.
    pub const RATE_WINDOWS: &str = "rate_windows";
    /// Cached recommendation sets, keyed by cache key.
    pub const CACHE_ENTRIES: &str = "cache_entries";
    /// Deduplicated book records, keyed by normalized (title, author).
    pub const BOOKS: &str = "books";
    /// Preference profiles, keyed by user id.
    pub const PROFILES: &str = "preference_profiles";
    /// Write-once log of recommendation searches.
    pub const SEARCH_LOG: &str = "search_log";
    /// Write-once log of raw feedback events.
    pub const FEEDBACK_LOG: &str = "feedback_log";
}

/// Key/value document store over named logical collections.
///
/// Every operation is a short, independent read or write; errors map to
/// [`ShelftalkerError::StoreUnavailable`](crate::ShelftalkerError::StoreUnavailable)
/// and each component applies its own degradation policy (fail open,
/// degrade to miss, drop the write).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch a document by key. `Ok(None)` when absent.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>>;

    /// Write (or overwrite) a document.
    async fn put(&self, collection: &str, key: &str, document: Document) -> Result<()>;

    /// Atomically read-modify-write one document and return the stored
    /// result. The closure sees `None` when the key is absent.
    async fn update(&self, collection: &str, key: &str, apply: UpdateFn) -> Result<Document>;

    /// Whether a document exists for the key.
    async fn exists(&self, collection: &str, key: &str) -> Result<bool>;
}
