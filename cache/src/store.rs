use crate::entry::Record;

use core::fmt;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;
use parking_lot::RwLock;

/// A helper function to hash a key using a `BuildHasher`.
#[inline]
pub(crate) fn hash_key<K: Hash, H: BuildHasher>(hasher: &H, key: &K) -> u64 {
  let mut state = hasher.build_hasher();
  key.hash(&mut state);
  state.finish()
}

pub(crate) type ShardMap<K, V, H> = HashMap<K, Record<V>, H>;

/// The authoritative key to record mapping, partitioned into independently
/// locked shards.
///
/// Readers that only need existence or a value (`peek`, `contains_key`) take a
/// single shard's read lock. Structural writes are made by the engine while it
/// also holds the index lock, so a record never appears here without its
/// index entries for longer than one engine operation.
pub(crate) struct ShardedStore<K, V, H> {
  shards: Box<[CachePadded<RwLock<ShardMap<K, V, H>>>]>,
  hasher: H,
  len: CachePadded<AtomicUsize>,
}

impl<K, V, H> fmt::Debug for ShardedStore<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ShardedStore")
      .field("num_shards", &self.shards.len())
      .field("len", &self.len.load(Ordering::Relaxed))
      .finish()
  }
}

impl<K, V, H> ShardedStore<K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher + Clone,
{
  /// Creates a new `ShardedStore` with the specified number of shards and hasher.
  pub(crate) fn new(num_shards: usize, hasher: H) -> Self {
    let shards = (0..num_shards.max(1))
      .map(|_| CachePadded::new(RwLock::new(HashMap::with_hasher(hasher.clone()))))
      .collect::<Vec<_>>();

    Self {
      shards: shards.into_boxed_slice(),
      hasher,
      len: CachePadded::new(AtomicUsize::new(0)),
    }
  }

  /// Returns the lock guarding the shard for a given key.
  #[inline]
  pub(crate) fn get_shard(&self, key: &K) -> &RwLock<ShardMap<K, V, H>> {
    let index = hash_key(&self.hasher, key) as usize % self.shards.len();
    &self.shards[index]
  }

  /// Inserts or replaces the record for `key`, returning the old one.
  pub(crate) fn insert(&self, key: K, record: Record<V>) -> Option<Record<V>> {
    let old = self.get_shard(&key).write().insert(key, record);
    if old.is_none() {
      self.len.fetch_add(1, Ordering::Relaxed);
    }
    old
  }

  /// Removes the record for `key`, if resident.
  pub(crate) fn remove(&self, key: &K) -> Option<Record<V>> {
    let old = self.get_shard(key).write().remove(key);
    if old.is_some() {
      self.len.fetch_sub(1, Ordering::Relaxed);
    }
    old
  }

  /// Runs `f` against the record for `key` under the shard's write lock.
  pub(crate) fn with_record_mut<R>(&self, key: &K, f: impl FnOnce(&mut Record<V>) -> R) -> Option<R> {
    self.get_shard(key).write().get_mut(key).map(f)
  }

  /// Runs `f` against the record for `key` under the shard's read lock.
  pub(crate) fn with_record<R>(&self, key: &K, f: impl FnOnce(&Record<V>) -> R) -> Option<R> {
    self.get_shard(key).read().get(key).map(f)
  }

  /// The number of resident records.
  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.len.load(Ordering::Relaxed)
  }

  /// Returns an iterator over all the shard locks.
  #[cfg(test)]
  pub(crate) fn iter_shards(&self) -> impl Iterator<Item = &RwLock<ShardMap<K, V, H>>> {
    self.shards.iter().map(|padded_lock| &**padded_lock)
  }
}
