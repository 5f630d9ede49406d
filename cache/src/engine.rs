//! The eviction engine.
//!
//! Holds the three structures that describe the cache's contents, the record
//! store and the expiry and priority indices, and keeps them consistent. The
//! store is sharded for readers. Every structural change goes through the
//! index lock, which is only ever held for in-memory work and never across a
//! backing store call, so a record and its index entries change together as
//! far as any other lane can tell.
//!
//! Operations for a key run on the key's lane. The lane guarantees that
//! nothing else touches that key between the steps of an operation, which is
//! what lets a miss release the index lock while it waits on the backing
//! store.
//!
//! Lanes order operations per key but cannot protect the indices, which are
//! shared by every key: making room for one key evicts whichever key ranks
//! lowest, wherever it is routed. The index lock is that synchronization. It
//! covers only the in-memory steps of an operation, never a backing store
//! call, so unrelated keys contend on it for the length of a map update and
//! nothing longer.
//!
//! Write-back persists leave the lane through a per-lane ordered queue, so
//! the store sees a key's values in the order they were set.

use crate::backing::{BackingStore, PersistenceMode};
use crate::entry::{AccessMetadata, Record};
use crate::error::CacheError;
use crate::index::{ExpiryIndex, PriorityIndex};
use crate::listener::EvictionReason;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::policy::OrderingPolicy;
use crate::router::{LaneId, ShardRouter};
use crate::store::ShardedStore;
use crate::task::notifier::Notifier;
use crate::task::persister::Persister;
use crate::time::{self, Timestamp};
use crate::TaskSpawner;

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

/// The two ordered indices, guarded together.
#[derive(Debug)]
pub(crate) struct Indices<K> {
  pub(crate) expiry: ExpiryIndex<K>,
  pub(crate) priority: PriorityIndex<K>,
}

impl<K: Eq + Hash + Clone> Indices<K> {
  fn new(policy: OrderingPolicy) -> Self {
    Self {
      expiry: ExpiryIndex::new(),
      priority: PriorityIndex::new(policy),
    }
  }

  /// Records an access: the stale priority entry comes out before the
  /// metadata changes and the fresh one goes in after.
  fn bump<V>(&mut self, key: &K, record: &mut Record<V>, now: Timestamp) {
    self.priority.remove(record.metadata, key);
    record.metadata.touch(now);
    self.priority.insert(record.metadata, key.clone());
  }
}

/// Immutable settings the engine is built with.
#[derive(Debug, Clone)]
pub(crate) struct EngineSettings {
  pub(crate) policy: OrderingPolicy,
  /// Time-to-live in `Timestamp` ticks.
  pub(crate) ttl: u64,
  pub(crate) capacity: usize,
  pub(crate) reset_frequency_on_overwrite: bool,
}

/// What a lookup found for a key.
enum Lookup<V> {
  Hit(Arc<V>),
  Expired,
  Absent,
}

pub(crate) struct EvictionEngine<K: Send, V: Send + Sync, S, H> {
  store: ShardedStore<K, V, H>,
  indices: Mutex<Indices<K>>,
  router: ShardRouter<H>,
  backing: Arc<S>,
  persister: Persister<K, V>,
  metrics: Arc<Metrics>,
  notifier: Option<Notifier<K, V>>,
  settings: EngineSettings,
}

impl<K: Send, V: Send + Sync, S, H> fmt::Debug for EvictionEngine<K, V, S, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EvictionEngine")
      .field("settings", &self.settings)
      .field("store", &self.store)
      .field("router", &self.router)
      .field("has_listener", &self.notifier.is_some())
      .finish_non_exhaustive()
  }
}

impl<K, V, S, H> EvictionEngine<K, V, S, H>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
  S: BackingStore<K, V>,
  H: BuildHasher + Clone + Send + Sync + 'static,
{
  pub(crate) fn new(
    settings: EngineSettings,
    lanes: usize,
    hasher: H,
    backing: Arc<S>,
    spawner: Arc<dyn TaskSpawner>,
    notifier: Option<Notifier<K, V>>,
  ) -> Self {
    let router = ShardRouter::spawn(lanes, hasher.clone(), spawner.as_ref());
    let metrics = Arc::new(Metrics::new());
    let persister = Persister::spawn(
      lanes,
      Arc::clone(&backing),
      Arc::clone(&metrics),
      spawner.as_ref(),
    );
    Self {
      store: ShardedStore::new(lanes, hasher),
      indices: Mutex::new(Indices::new(settings.policy)),
      router,
      backing,
      persister,
      metrics,
      notifier,
      settings,
    }
  }

  // --- Lane entry points ---

  /// Returns the value for `key`, reading through to the backing store on a
  /// miss or when the resident record has expired.
  pub(crate) async fn get(self: &Arc<Self>, key: K) -> Result<Arc<V>, CacheError> {
    let lane = self.router.lane_for(&key);
    let engine = Arc::clone(self);
    self
      .router
      .submit(lane, async move { engine.get_in_lane(key).await })
      .await?
  }

  /// Stores `value` under `key`, persisting it as `mode` dictates.
  pub(crate) async fn set(
    self: &Arc<Self>,
    key: K,
    value: V,
    mode: PersistenceMode,
  ) -> Result<(), CacheError> {
    let lane = self.router.lane_for(&key);
    let engine = Arc::clone(self);
    let value = Arc::new(value);
    self
      .router
      .submit(lane, async move {
        match mode {
          PersistenceMode::WriteThrough => engine.write_through(key, value).await,
          PersistenceMode::WriteBack => {
            engine.write_back(lane, key, value);
            Ok(())
          }
        }
      })
      .await?
  }

  async fn get_in_lane(&self, key: K) -> Result<Arc<V>, CacheError> {
    match self.lookup(&key, time::now()) {
      Lookup::Hit(value) => {
        Metrics::incr(&self.metrics.hits);
        trace!("cache hit");
        return Ok(value);
      }
      Lookup::Expired => trace!("cache entry expired, refetching"),
      Lookup::Absent => trace!("cache miss"),
    }
    Metrics::incr(&self.metrics.misses);

    // Nothing has been inserted yet, so a failure here leaves no trace.
    let value = match self.backing.fetch(&key).await {
      Ok(Some(value)) => Arc::new(value),
      Ok(None) => return Err(CacheError::NotFound),
      Err(err) => {
        Metrics::incr(&self.metrics.fetch_failures);
        return Err(CacheError::BackingStore(err));
      }
    };

    self.admit(key, Arc::clone(&value), time::now());
    Ok(value)
  }

  async fn write_through(&self, key: K, value: Arc<V>) -> Result<(), CacheError> {
    if let Err(err) = self.backing.persist(&key, &value).await {
      Metrics::incr(&self.metrics.persist_failures);
      return Err(CacheError::BackingStore(err));
    }
    self.apply_set(key, value, time::now());
    Ok(())
  }

  fn write_back(&self, lane: LaneId, key: K, value: Arc<V>) {
    self.apply_set(key.clone(), Arc::clone(&value), time::now());
    self.persister.enqueue(lane, key, value);
  }

  // --- In-memory transitions, each under the index lock ---

  fn lookup(&self, key: &K, now: Timestamp) -> Lookup<V> {
    let mut indices = self.indices.lock();
    let ttl = self.settings.ttl;

    let found = self.store.with_record_mut(key, |record| {
      if record.is_expired(ttl, now) {
        None
      } else {
        indices.bump(key, record, now);
        Some(record.value())
      }
    });

    match found {
      Some(Some(value)) => Lookup::Hit(value),
      Some(None) => {
        self.remove(&mut indices, key, EvictionReason::Expired);
        Lookup::Expired
      }
      None => Lookup::Absent,
    }
  }

  /// Inserts a record fetched on a miss.
  fn admit(&self, key: K, value: Arc<V>, now: Timestamp) {
    let mut indices = self.indices.lock();
    self.insert_new(&mut indices, key, value, now);
  }

  fn apply_set(&self, key: K, value: Arc<V>, now: Timestamp) {
    let mut indices = self.indices.lock();
    self.sweep(&mut indices, now);

    let reset = self.settings.reset_frequency_on_overwrite;
    let replaced = self.store.with_record_mut(&key, |record| {
      indices.expiry.remove(record.load_time, &key);
      if reset {
        indices.priority.remove(record.metadata, &key);
        record.metadata = AccessMetadata {
          frequency: 0,
          ..record.metadata
        };
      }
      let old = std::mem::replace(&mut record.value, Arc::clone(&value));
      record.load_time = now;
      indices.expiry.insert(now, key.clone());
      indices.bump(&key, record, now);
      old
    });

    match replaced {
      Some(old) => {
        Metrics::incr(&self.metrics.updates);
        self.notify(key, old, EvictionReason::Replaced);
      }
      None => self.insert_new(&mut indices, key, value, now),
    }
  }

  fn insert_new(&self, indices: &mut Indices<K>, key: K, value: Arc<V>, now: Timestamp) {
    self.make_room(indices);

    let mut record = Record::new(value, now);
    indices.expiry.insert(now, key.clone());
    indices.bump(&key, &mut record, now);
    self.store.insert(key, record);
    Metrics::incr(&self.metrics.inserts);
  }

  /// Evicts the least valuable records until one more fits.
  fn make_room(&self, indices: &mut Indices<K>) {
    while self.store.len() >= self.settings.capacity {
      let Some(victim) = indices.priority.pop_lowest() else {
        break;
      };
      if let Some(record) = self.store.remove(&victim) {
        indices.expiry.remove(record.load_time, &victim);
        Metrics::incr(&self.metrics.evicted_by_capacity);
        debug!(policy = %self.settings.policy, "evicted entry for capacity");
        self.notify(victim, record.value, EvictionReason::Capacity);
      }
    }
  }

  /// Drops every record whose time-to-live has passed.
  fn sweep(&self, indices: &mut Indices<K>, now: Timestamp) {
    let expired = indices.expiry.sweep(self.settings.ttl, now);
    if expired.is_empty() {
      return;
    }
    debug!(count = expired.len(), "sweeping expired entries");
    for key in expired {
      let Some(metadata) = self.store.with_record(&key, |record| record.metadata) else {
        continue;
      };
      indices.priority.remove(metadata, &key);
      if let Some(record) = self.store.remove(&key) {
        Metrics::incr(&self.metrics.evicted_by_ttl);
        self.notify(key, record.value, EvictionReason::Expired);
      }
    }
  }

  /// Unindexes and then drops a single record.
  fn remove(&self, indices: &mut Indices<K>, key: &K, reason: EvictionReason) {
    let Some((load_time, metadata)) = self
      .store
      .with_record(key, |record| (record.load_time, record.metadata))
    else {
      return;
    };
    indices.expiry.remove(load_time, key);
    indices.priority.remove(metadata, key);
    if let Some(record) = self.store.remove(key) {
      if reason == EvictionReason::Expired {
        Metrics::incr(&self.metrics.evicted_by_ttl);
      }
      self.notify(key.clone(), record.value, reason);
    }
  }

  fn notify(&self, key: K, value: Arc<V>, reason: EvictionReason) {
    if let Some(notifier) = &self.notifier {
      notifier.notify(key, value, reason);
    }
  }

  // --- Read-only inspection ---

  /// The resident, unexpired value for `key`, without counting an access.
  pub(crate) fn peek(&self, key: &K) -> Option<Arc<V>> {
    let now = time::now();
    let ttl = self.settings.ttl;
    self
      .store
      .with_record(key, |record| (!record.is_expired(ttl, now)).then(|| record.value()))
      .flatten()
  }

  pub(crate) fn len(&self) -> usize {
    self.store.len()
  }

  pub(crate) fn lane_for(&self, key: &K) -> LaneId {
    self.router.lane_for(key)
  }

  pub(crate) fn lane_count(&self) -> usize {
    self.router.lane_count()
  }

  pub(crate) fn settings(&self) -> &EngineSettings {
    &self.settings
  }

  pub(crate) fn metrics(&self) -> MetricsSnapshot {
    self.metrics.snapshot(self.store.len())
  }

  /// Panics unless every resident key is indexed exactly once in each index.
  #[cfg(test)]
  pub(crate) fn assert_consistent(&self) {
    let indices = self.indices.lock();
    let mut resident = 0;
    for shard in self.store.iter_shards() {
      for (key, record) in shard.read().iter() {
        resident += 1;
        assert!(
          indices.expiry.contains(record.load_time, key),
          "resident record missing from expiry index"
        );
        assert!(
          indices.priority.contains(record.metadata, key),
          "resident record missing from priority index"
        );
      }
    }
    assert_eq!(resident, self.store.len());
    assert_eq!(indices.expiry.len(), resident);
    assert_eq!(indices.priority.len(), resident);
  }
}
