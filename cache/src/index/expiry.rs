use crate::entry;
use crate::time::Timestamp;

use std::collections::BTreeMap;
use std::hash::Hash;

use ahash::HashSet;

/// Keys bucketed by the time their record was loaded, oldest first.
#[derive(Debug)]
pub(crate) struct ExpiryIndex<K> {
  buckets: BTreeMap<Timestamp, HashSet<K>>,
  len: usize,
}

impl<K> ExpiryIndex<K>
where
  K: Eq + Hash,
{
  pub(crate) fn new() -> Self {
    Self {
      buckets: BTreeMap::new(),
      len: 0,
    }
  }

  pub(crate) fn insert(&mut self, load_time: Timestamp, key: K) {
    if self.buckets.entry(load_time).or_default().insert(key) {
      self.len += 1;
    }
  }

  /// Removes `key` from the bucket for `load_time`, dropping the bucket once
  /// it is empty. Returns whether the key was indexed there.
  pub(crate) fn remove(&mut self, load_time: Timestamp, key: &K) -> bool {
    let Some(bucket) = self.buckets.get_mut(&load_time) else {
      return false;
    };
    let removed = bucket.remove(key);
    if bucket.is_empty() {
      self.buckets.remove(&load_time);
    }
    if removed {
      self.len -= 1;
    }
    removed
  }

  /// Drains every bucket whose load time is past `ttl` at `now`, oldest first.
  pub(crate) fn sweep(&mut self, ttl: u64, now: Timestamp) -> Vec<K> {
    let mut expired = Vec::new();
    while let Some(oldest) = self.buckets.first_entry() {
      if !entry::is_expired(*oldest.key(), ttl, now) {
        break;
      }
      let bucket = oldest.remove();
      self.len -= bucket.len();
      expired.extend(bucket);
    }
    expired
  }

  #[cfg(test)]
  pub(crate) fn contains(&self, load_time: Timestamp, key: &K) -> bool {
    self
      .buckets
      .get(&load_time)
      .is_some_and(|bucket| bucket.contains(key))
  }

  pub(crate) fn len(&self) -> usize {
    self.len
  }
}
