use std::fmt;
use std::sync::Arc;

/// Describes the reason an entry was removed from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
  /// The entry was the least valuable one when room was needed.
  Capacity,
  /// The entry's time-to-live had passed.
  Expired,
  /// A `set` overwrote the entry's value.
  Replaced,
}

impl fmt::Display for EvictionReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EvictionReason::Capacity => write!(f, "evicted due to capacity"),
      EvictionReason::Expired => write!(f, "evicted due to expiration"),
      EvictionReason::Replaced => write!(f, "replaced by a newer value"),
    }
  }
}

/// A listener that can be registered with the cache to receive notifications
/// when values leave it.
///
/// Called on a dedicated background thread, never on a cache lane, so a slow
/// listener delays other notifications but not cache operations.
pub trait EvictionListener<K, V>: Send + Sync {
  fn on_evict(&self, key: K, value: Arc<V>, reason: EvictionReason);
}
