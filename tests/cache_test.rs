//! Tests for [`RecommendationCache`] — content-addressed TTL cache
//! with lazy expiry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shelftalker::{
    BookRecommendation, Clock, Document, KeyValueStore, ManualClock, MemoryStore, QueryKind,
    QueryOptions, RecommendationCache, ShelftalkerError, UpdateFn, cache_key,
};

fn make_book(title: &str) -> BookRecommendation {
    BookRecommendation {
        id: format!("id-{title}"),
        title: title.to_string(),
        author: "Author".to_string(),
        publication_date: "2001".to_string(),
        description: "desc".to_string(),
        genres: vec!["Fiction".to_string()],
        rating: 4.0,
        review_count: 10,
        page_count: 320,
        image_url: "/images/book-placeholder.png".to_string(),
    }
}

struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _: &str, _: &str) -> shelftalker::Result<Option<Document>> {
        Err(ShelftalkerError::StoreUnavailable("down".into()))
    }
    async fn put(&self, _: &str, _: &str, _: Document) -> shelftalker::Result<()> {
        Err(ShelftalkerError::StoreUnavailable("down".into()))
    }
    async fn update(&self, _: &str, _: &str, _: UpdateFn) -> shelftalker::Result<Document> {
        Err(ShelftalkerError::StoreUnavailable("down".into()))
    }
    async fn exists(&self, _: &str, _: &str) -> shelftalker::Result<bool> {
        Err(ShelftalkerError::StoreUnavailable("down".into()))
    }
}

// =========================================================================
// Round trip and expiry
// =========================================================================

#[tokio::test]
async fn put_then_get_returns_results() {
    let clock = Arc::new(ManualClock::at(0));
    let cache = RecommendationCache::new(Arc::new(MemoryStore::new()), clock);
    let options = QueryOptions::default();
    let key = cache_key("dune", &options);
    let results = vec![make_book("Dune"), make_book("Hyperion")];

    cache
        .put(&key, "dune", &options, &results, Duration::from_secs(60))
        .await;

    let cached = cache.get(&key).await.expect("cache hit");
    assert_eq!(cached, results);
}

#[tokio::test]
async fn expired_entry_reads_as_miss() {
    let clock = Arc::new(ManualClock::at(0));
    let cache = RecommendationCache::new(Arc::new(MemoryStore::new()), Arc::clone(&clock) as Arc<dyn Clock>);
    let options = QueryOptions::default();
    let key = cache_key("dune", &options);

    cache
        .put(&key, "dune", &options, &[make_book("Dune")], Duration::from_secs(60))
        .await;
    assert!(cache.get(&key).await.is_some());

    // One millisecond past the TTL.
    clock.advance(60_001);
    assert!(cache.get(&key).await.is_none());
}

#[tokio::test]
async fn absent_key_is_a_miss() {
    let clock = Arc::new(ManualClock::at(0));
    let cache = RecommendationCache::new(Arc::new(MemoryStore::new()), clock);
    assert!(cache.get("nope").await.is_none());
}

#[tokio::test]
async fn put_overwrites_existing_entry() {
    let clock = Arc::new(ManualClock::at(0));
    let cache = RecommendationCache::new(Arc::new(MemoryStore::new()), clock);
    let options = QueryOptions::default();
    let key = cache_key("dune", &options);

    cache
        .put(&key, "dune", &options, &[make_book("Old")], Duration::from_secs(60))
        .await;
    cache
        .put(&key, "dune", &options, &[make_book("New")], Duration::from_secs(60))
        .await;

    let cached = cache.get(&key).await.expect("cache hit");
    assert_eq!(cached[0].title, "New");
}

// =========================================================================
// Key construction
// =========================================================================

#[test]
fn equal_logical_queries_share_a_key() {
    let options = QueryOptions::new().max_results(5);
    assert_eq!(cache_key("  Dune ", &options), cache_key("dune", &options));
}

#[test]
fn query_kind_changes_the_key() {
    assert_ne!(
        cache_key("dune", &QueryOptions::new().kind(QueryKind::Search)),
        cache_key("dune", &QueryOptions::new().kind(QueryKind::Similar))
    );
}

#[test]
fn genre_options_change_the_key() {
    assert_ne!(
        cache_key("dune", &QueryOptions::default()),
        cache_key("dune", &QueryOptions::new().genres(vec!["Sci-Fi".into()]))
    );
}

// =========================================================================
// Failure policy
// =========================================================================

#[tokio::test]
async fn failing_store_degrades_to_miss() {
    let clock = Arc::new(ManualClock::at(0));
    let cache = RecommendationCache::new(Arc::new(FailingStore), clock);
    assert!(cache.get("any").await.is_none());
}

#[tokio::test]
async fn failing_store_swallows_writes() {
    let clock = Arc::new(ManualClock::at(0));
    let cache = RecommendationCache::new(Arc::new(FailingStore), clock);
    // Must not panic or propagate.
    cache
        .put(
            "any",
            "dune",
            &QueryOptions::default(),
            &[make_book("Dune")],
            Duration::from_secs(60),
        )
        .await;
}

#[tokio::test]
async fn undecodable_entry_reads_as_miss() {
    let store = Arc::new(MemoryStore::new());
    store
        .put(
            shelftalker::collections::CACHE_ENTRIES,
            "bad",
            serde_json::json!({"not": "a cache entry"}),
        )
        .await
        .unwrap();

    let clock = Arc::new(ManualClock::at(0));
    let cache = RecommendationCache::new(store, clock);
    assert!(cache.get("bad").await.is_none());
}
