mod common;

use common::{build_test_cache, within};
use lanecache::{CacheError, OrderingPolicy};

#[tokio::test]
async fn test_get_reads_through_on_miss_then_hits() {
  let (cache, store) = build_test_cache(OrderingPolicy::Recency, 10);
  store.seed("key", 7);

  assert_eq!(*within(cache.get("key")).await.unwrap(), 7);
  assert_eq!(store.fetch_count(), 1);

  // The second read is served from memory.
  assert_eq!(*within(cache.get("key")).await.unwrap(), 7);
  assert_eq!(store.fetch_count(), 1);

  let metrics = cache.metrics();
  assert_eq!(metrics.misses, 1);
  assert_eq!(metrics.hits, 1);
  assert_eq!(metrics.inserts, 1);
  assert_eq!(metrics.current_entries, 1);
}

#[tokio::test]
async fn test_get_of_unknown_key_is_not_found() {
  let (cache, store) = build_test_cache(OrderingPolicy::Recency, 10);

  let err = within(cache.get("missing")).await.unwrap_err();
  assert!(err.is_not_found());
  assert!(cache.is_empty());
  assert_eq!(store.fetch_count(), 1);
}

#[tokio::test]
async fn test_fetch_failure_propagates_without_inserting() {
  let (cache, store) = build_test_cache(OrderingPolicy::Recency, 10);
  store.seed("key", 1);
  store.fail_fetches(true);

  let err = within(cache.get("key")).await.unwrap_err();
  assert!(matches!(err, CacheError::BackingStore(_)));
  assert!(cache.is_empty());
  assert!(!cache.contains_key(&"key"));
  assert_eq!(cache.metrics().fetch_failures, 1);

  // Once the store recovers the same key loads normally.
  store.fail_fetches(false);
  assert_eq!(*within(cache.get("key")).await.unwrap(), 1);
  assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_set_then_get_serves_from_memory() {
  let (cache, store) = build_test_cache(OrderingPolicy::Recency, 10);

  within(cache.set("a", 1)).await.unwrap();
  assert_eq!(*within(cache.get("a")).await.unwrap(), 1);
  assert_eq!(store.fetch_count(), 0);
  assert_eq!(store.stored(&"a"), Some(1));
}

#[tokio::test]
async fn test_set_overwrites_resident_value() {
  let (cache, _store) = build_test_cache(OrderingPolicy::Recency, 10);

  within(cache.set("a", 1)).await.unwrap();
  within(cache.set("a", 2)).await.unwrap();

  assert_eq!(cache.len(), 1);
  assert_eq!(*within(cache.get("a")).await.unwrap(), 2);
  let metrics = cache.metrics();
  assert_eq!(metrics.inserts, 1);
  assert_eq!(metrics.updates, 1);
}

#[tokio::test]
async fn test_peek_does_not_read_through() {
  let (cache, store) = build_test_cache(OrderingPolicy::Recency, 10);
  store.seed("a", 1);

  assert!(cache.peek(&"a").is_none());
  assert_eq!(store.fetch_count(), 0);

  within(cache.get("a")).await.unwrap();
  assert_eq!(cache.peek(&"a").as_deref(), Some(&1));
  assert!(cache.contains_key(&"a"));
  assert_eq!(cache.metrics().hits, 0);
}

#[tokio::test]
async fn test_cloned_handles_share_state() {
  let (cache, _store) = build_test_cache(OrderingPolicy::Recency, 10);
  let other = cache.clone();

  within(cache.set("shared", 3)).await.unwrap();
  assert_eq!(*within(other.get("shared")).await.unwrap(), 3);
  assert_eq!(other.len(), 1);
}

#[tokio::test]
async fn test_cache_reports_its_configuration() {
  let (cache, _store) = build_test_cache(OrderingPolicy::Frequency, 42);

  assert_eq!(cache.capacity(), 42);
  assert_eq!(cache.eviction_policy(), OrderingPolicy::Frequency);
  assert_eq!(cache.lane_count(), 5);
  assert_eq!(cache.time_to_live(), std::time::Duration::from_secs(60));
}
