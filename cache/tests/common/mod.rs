#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::hash::{BuildHasher, Hash, Hasher};
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use lanecache::{BackingStore, BoxError, Cache, CacheBuilder, OrderingPolicy, PersistenceMode};
use parking_lot::Mutex;

// A custom hasher that allows us to control which lane a key is assigned to.
// It simply uses the integer value of the key as its hash.
// For a 4-lane cache:
// - key 0 -> lane 0 (0 % 4 = 0)
// - key 1 -> lane 1 (1 % 4 = 1)
// - key 4 -> lane 0 (4 % 4 = 0)
#[derive(Clone, Default)]
pub struct LaneControllingHasher;
impl BuildHasher for LaneControllingHasher {
  type Hasher = TestHasher;
  fn build_hasher(&self) -> Self::Hasher {
    TestHasher(0)
  }
}
pub struct TestHasher(u64);
impl Hasher for TestHasher {
  fn finish(&self) -> u64 {
    self.0
  }
  fn write(&mut self, _: &[u8]) {
    unimplemented!()
  }
  fn write_i32(&mut self, i: i32) {
    self.0 = i as u64;
  }
}

/// A backing store whose behaviour tests can steer.
pub struct TestStore<K, V> {
  data: Mutex<HashMap<K, V>>,
  fail_fetches: AtomicBool,
  fail_persists: AtomicBool,
  persist_delays: Mutex<VecDeque<Duration>>,
  fetches: AtomicUsize,
  persists: AtomicUsize,
}

impl<K: Eq + Hash + Clone, V: Clone> TestStore<K, V> {
  pub fn new() -> Arc<Self> {
    Arc::new(Self {
      data: Mutex::new(HashMap::new()),
      fail_fetches: AtomicBool::new(false),
      fail_persists: AtomicBool::new(false),
      persist_delays: Mutex::new(VecDeque::new()),
      fetches: AtomicUsize::new(0),
      persists: AtomicUsize::new(0),
    })
  }

  pub fn seed(&self, key: K, value: V) {
    self.data.lock().insert(key, value);
  }

  pub fn stored(&self, key: &K) -> Option<V> {
    self.data.lock().get(key).cloned()
  }

  pub fn fail_fetches(&self, fail: bool) {
    self.fail_fetches.store(fail, Ordering::SeqCst);
  }

  pub fn fail_persists(&self, fail: bool) {
    self.fail_persists.store(fail, Ordering::SeqCst);
  }

  /// Queues a delay for the next persist call to take.
  pub fn delay_next_persist(&self, delay: Duration) {
    self.persist_delays.lock().push_back(delay);
  }

  pub fn fetch_count(&self) -> usize {
    self.fetches.load(Ordering::SeqCst)
  }

  pub fn persist_count(&self) -> usize {
    self.persists.load(Ordering::SeqCst)
  }
}

impl<K, V> BackingStore<K, V> for TestStore<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Clone + Send + Sync + 'static,
{
  fn fetch<'a>(&'a self, key: &'a K) -> BoxFuture<'a, Result<Option<V>, BoxError>> {
    Box::pin(async move {
      self.fetches.fetch_add(1, Ordering::SeqCst);
      if self.fail_fetches.load(Ordering::SeqCst) {
        return Err(io::Error::new(io::ErrorKind::Other, "fetch failed").into());
      }
      Ok(self.data.lock().get(key).cloned())
    })
  }

  fn persist<'a>(&'a self, key: &'a K, value: &'a V) -> BoxFuture<'a, Result<(), BoxError>> {
    let delay = self.persist_delays.lock().pop_front();
    Box::pin(async move {
      if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
      }
      self.persists.fetch_add(1, Ordering::SeqCst);
      if self.fail_persists.load(Ordering::SeqCst) {
        return Err(io::Error::new(io::ErrorKind::Other, "persist failed").into());
      }
      self.data.lock().insert(key.clone(), value.clone());
      Ok(())
    })
  }
}

pub type TestCache = Cache<&'static str, i32, TestStore<&'static str, i32>>;

/// Builds a cache with a long TTL so only capacity evicts.
pub fn build_test_cache(
  policy: OrderingPolicy,
  capacity: usize,
) -> (TestCache, Arc<TestStore<&'static str, i32>>) {
  let store = TestStore::new();
  let cache = CacheBuilder::default()
    .capacity(capacity)
    .eviction_policy(policy)
    .time_to_live(Duration::from_secs(60))
    .build(store.clone())
    .unwrap();
  (cache, store)
}

pub fn build_lane_cache(
  lanes: usize,
  mode: PersistenceMode,
) -> (
  Cache<i32, i32, TestStore<i32, i32>, LaneControllingHasher>,
  Arc<TestStore<i32, i32>>,
) {
  let store = TestStore::new();
  let cache = CacheBuilder::new()
    .lanes(lanes)
    .persistence_mode(mode)
    .hasher(LaneControllingHasher)
    .build(store.clone())
    .unwrap();
  (cache, store)
}

/// Awaits `operation`, failing the test if it does not finish within two
/// seconds.
pub async fn within<F: std::future::Future>(operation: F) -> F::Output {
  tokio::time::timeout(Duration::from_secs(2), operation)
    .await
    .expect("cache operation did not complete in time")
}
