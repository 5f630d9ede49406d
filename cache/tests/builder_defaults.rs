mod common;

use std::sync::Arc;
use std::time::Duration;

use common::TestStore;
use lanecache::{
  BuildError, Cache, CacheBuilder, CacheConfig, InMemoryStore, OrderingPolicy, PersistenceMode,
};

fn builder() -> CacheBuilder<&'static str, i32> {
  CacheBuilder::default()
}

#[tokio::test]
async fn test_builder_defaults() {
  let cache = builder().build(TestStore::new()).unwrap();

  assert_eq!(cache.capacity(), 10_000);
  assert_eq!(cache.lane_count(), 5);
  assert_eq!(cache.time_to_live(), Duration::from_secs(60));
  assert_eq!(cache.eviction_policy(), OrderingPolicy::Recency);
  assert_eq!(cache.persistence_mode(), PersistenceMode::WriteThrough);
}

#[tokio::test]
async fn test_zero_values_are_rejected() {
  let err = builder().capacity(0).build(TestStore::new()).unwrap_err();
  assert_eq!(err, BuildError::ZeroCapacity);

  let err = builder().lanes(0).build(TestStore::new()).unwrap_err();
  assert_eq!(err, BuildError::ZeroLanes);

  let err = builder()
    .time_to_live(Duration::ZERO)
    .build(TestStore::new())
    .unwrap_err();
  assert_eq!(err, BuildError::ZeroExpiry);
}

#[tokio::test]
async fn test_builder_from_config() {
  let config = CacheConfig {
    eviction_policy: "LFU".to_string(),
    expiry_millis: 2_500,
    capacity: 64,
    persistence_mode: "WriteBack".to_string(),
    lane_count: 3,
    reset_frequency_on_overwrite: true,
  };
  let cache: Cache<&'static str, i32, _> = CacheBuilder::from_config(&config)
    .unwrap()
    .build(TestStore::new())
    .unwrap();

  assert_eq!(cache.eviction_policy(), OrderingPolicy::Frequency);
  assert_eq!(cache.persistence_mode(), PersistenceMode::WriteBack);
  assert_eq!(cache.time_to_live(), Duration::from_millis(2_500));
  assert_eq!(cache.capacity(), 64);
  assert_eq!(cache.lane_count(), 3);
}

#[test]
fn test_unknown_names_in_config_are_rejected() {
  let config = CacheConfig {
    eviction_policy: "FIFO".to_string(),
    ..CacheConfig::default()
  };
  let err = CacheBuilder::<&'static str, i32>::from_config(&config).unwrap_err();
  assert!(matches!(err, BuildError::InvalidConfiguration(_)));

  let config = CacheConfig {
    persistence_mode: "WriteAround".to_string(),
    ..CacheConfig::default()
  };
  let err = CacheBuilder::<&'static str, i32>::from_config(&config).unwrap_err();
  assert!(matches!(err, BuildError::InvalidConfiguration(_)));
}

#[test]
fn test_zero_values_in_config_are_rejected_at_build() {
  let config = CacheConfig {
    lane_count: 0,
    ..CacheConfig::default()
  };
  let err = CacheBuilder::<&'static str, i32>::from_config(&config)
    .unwrap()
    .build(Arc::new(InMemoryStore::new()))
    .unwrap_err();
  assert_eq!(err, BuildError::ZeroLanes);
}

#[test]
fn test_build_outside_runtime_requires_spawner() {
  let err = builder().build(TestStore::new()).unwrap_err();
  assert_eq!(err, BuildError::SpawnerRequired);
}

#[test]
fn test_build_with_explicit_spawner() {
  let runtime = tokio::runtime::Runtime::new().unwrap();
  let cache = builder()
    .spawner(Arc::new(lanecache::TokioSpawner::with_handle(
      runtime.handle().clone(),
    )))
    .build(TestStore::new())
    .unwrap();

  let value = runtime.block_on(async {
    cache.set("a", 1).await.unwrap();
    cache.get("a").await.unwrap()
  });
  assert_eq!(*value, 1);
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_builder_from_yaml() {
  let config = CacheConfig::from_yaml_str(
    "evictionPolicy: Frequency\nexpiryMillis: 1000\ncapacity: 2\npersistenceMode: write-through\n",
  )
  .unwrap();
  let cache: Cache<&'static str, i32, _> = CacheBuilder::from_config(&config)
    .unwrap()
    .build(TestStore::new())
    .unwrap();

  assert_eq!(cache.eviction_policy(), OrderingPolicy::Frequency);
  assert_eq!(cache.capacity(), 2);
  assert_eq!(cache.lane_count(), 5);
}
