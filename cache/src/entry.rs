use crate::time::Timestamp;

use std::sync::Arc;

/// Per-entry usage counters consulted by the `OrderingPolicy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessMetadata {
  /// When the entry was last read or written.
  pub last_access: Timestamp,
  /// How many times the entry has been read or written.
  pub frequency: u64,
}

impl AccessMetadata {
  /// Records one access at `now`.
  #[inline]
  pub(crate) fn touch(&mut self, now: Timestamp) {
    self.frequency = self.frequency.saturating_add(1);
    self.last_access = now;
  }
}

/// A resident value together with the bookkeeping the indices key on.
///
/// Owned by the `ShardedStore`. The expiry and priority indices only hold the
/// key, and resolve back to this record through the store.
#[derive(Debug)]
pub(crate) struct Record<V> {
  /// The user's value, wrapped in an Arc so reads can hand it out cheaply.
  pub(crate) value: Arc<V>,
  /// When the value was loaded or last overwritten.
  pub(crate) load_time: Timestamp,
  /// Zeroed until the first bump indexes the record by priority.
  pub(crate) metadata: AccessMetadata,
}

impl<V> Record<V> {
  /// Creates a record that has not been accessed yet.
  pub(crate) fn new(value: Arc<V>, load_time: Timestamp) -> Self {
    Self {
      value,
      load_time,
      metadata: AccessMetadata::default(),
    }
  }

  /// Returns a clone of the `Arc` containing the value.
  #[inline]
  pub(crate) fn value(&self) -> Arc<V> {
    self.value.clone()
  }

  /// Checks whether the record has outlived `ttl` ticks at `now`.
  #[inline]
  pub(crate) fn is_expired(&self, ttl: u64, now: Timestamp) -> bool {
    is_expired(self.load_time, ttl, now)
  }
}

/// A record loaded at `load_time` is stale once `load_time + ttl` is no longer
/// in the future.
#[inline]
pub(crate) fn is_expired(load_time: Timestamp, ttl: u64, now: Timestamp) -> bool {
  load_time.saturating_add(ttl) <= now
}
