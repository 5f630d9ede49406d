use crate::backing::{BackingStore, PersistenceMode};
use crate::engine::EvictionEngine;
use crate::error::CacheError;
use crate::policy::OrderingPolicy;
use crate::router::LaneId;
use crate::MetricsSnapshot;

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

/// A thread-safe, asynchronous read-through cache in front of a
/// `BackingStore`.
///
/// Cloning a `Cache` is cheap and yields another handle to the same cache.
/// The cache's lanes shut down once the last handle is dropped and any work
/// already queued has finished.
pub struct Cache<K: Send, V: Send + Sync, S, H = ahash::RandomState> {
  pub(crate) shared: Arc<EvictionEngine<K, V, S, H>>,
  pub(crate) mode: PersistenceMode,
}

impl<K: Send, V: Send + Sync, S, H> Clone for Cache<K, V, S, H> {
  fn clone(&self) -> Self {
    Self {
      shared: Arc::clone(&self.shared),
      mode: self.mode,
    }
  }
}

impl<K: Send, V: Send + Sync, S, H> fmt::Debug for Cache<K, V, S, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Cache")
      .field("mode", &self.mode)
      .field("engine", &self.shared)
      .finish()
  }
}

impl<K, V, S, H> Cache<K, V, S, H>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
  S: BackingStore<K, V>,
  H: BuildHasher + Clone + Send + Sync + 'static,
{
  /// Returns the value for `key`.
  ///
  /// Served from memory when resident and unexpired. Otherwise the value is
  /// fetched from the backing store and cached; `CacheError::NotFound` if the
  /// store has none.
  pub async fn get(&self, key: K) -> Result<Arc<V>, CacheError> {
    self.shared.get(key).await
  }

  /// Stores `value` under `key` according to the cache's persistence mode.
  ///
  /// Under write-through this resolves once the backing store has
  /// acknowledged, and on error the cache is left as it was. Under
  /// write-back it resolves as soon as the cache holds the value.
  pub async fn set(&self, key: K, value: V) -> Result<(), CacheError> {
    self.shared.set(key, value, self.mode).await
  }

  /// The resident, unexpired value for `key`, if any.
  ///
  /// Does not count as an access and never consults the backing store.
  pub fn peek(&self, key: &K) -> Option<Arc<V>> {
    self.shared.peek(key)
  }

  /// Whether `key` is resident and unexpired.
  pub fn contains_key(&self, key: &K) -> bool {
    self.shared.peek(key).is_some()
  }

  /// The number of resident entries, including any that have expired but not
  /// yet been swept.
  pub fn len(&self) -> usize {
    self.shared.len()
  }

  pub fn is_empty(&self) -> bool {
    self.shared.len() == 0
  }

  /// The lane operations on `key` are serialized on.
  pub fn lane_for(&self, key: &K) -> LaneId {
    self.shared.lane_for(key)
  }

  pub fn lane_count(&self) -> usize {
    self.shared.lane_count()
  }

  pub fn persistence_mode(&self) -> PersistenceMode {
    self.mode
  }

  pub fn eviction_policy(&self) -> OrderingPolicy {
    self.shared.settings().policy
  }

  pub fn capacity(&self) -> usize {
    self.shared.settings().capacity
  }

  pub fn time_to_live(&self) -> Duration {
    Duration::from_nanos(self.shared.settings().ttl)
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics()
  }
}
