//! In-memory store backend.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use moka::sync::Cache;

use super::{Document, KeyValueStore, UpdateFn};
use crate::Result;

/// Default per-collection capacity. High enough that the embedded
/// backend behaves like a durable store in practice; the bound exists
/// so a long-running process cannot grow without limit.
const DEFAULT_MAX_ENTRIES: u64 = 100_000;

/// Thread-safe in-memory implementation of [`KeyValueStore`].
///
/// Each logical collection is a bounded moka cache created on first
/// touch. `update` uses moka's entry API, which runs the closure under
/// the key's internal lock, so concurrent updates to one key serialize
/// instead of losing increments.
///
/// Intended for embedded use and tests; production deployments
/// implement [`KeyValueStore`] over their document store.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Cache<String, Document>>>,
    max_entries: u64,
}

impl MemoryStore {
    /// Create a store with the default per-collection capacity.
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Create a store with a custom per-collection capacity.
    pub fn with_max_entries(max_entries: u64) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    /// Fetch or create the named collection. Caches clone cheaply (they
    /// share state internally), so handing one out is fine.
    fn collection(&self, name: &str) -> Cache<String, Document> {
        if let Some(cache) = self
            .collections
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
        {
            return cache.clone();
        }
        self.collections
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(name.to_string())
            .or_insert_with(|| Cache::new(self.max_entries))
            .clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        Ok(self.collection(collection).get(key))
    }

    async fn put(&self, collection: &str, key: &str, document: Document) -> Result<()> {
        self.collection(collection).insert(key.to_string(), document);
        Ok(())
    }

    async fn update(&self, collection: &str, key: &str, apply: UpdateFn) -> Result<Document> {
        let entry = self
            .collection(collection)
            .entry(key.to_string())
            .and_upsert_with(|current| apply(current.map(|e| e.into_value())));
        Ok(entry.into_value())
    }

    async fn exists(&self, collection: &str, key: &str) -> Result<bool> {
        Ok(self.collection(collection).contains_key(key))
    }
}
