//! The backing store the cache reads through and writes to.

use crate::error::{BoxError, BuildError};

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use futures_util::future::{self, BoxFuture};
use parking_lot::RwLock;

/// The system of record behind the cache.
///
/// Both operations must eventually resolve. A future that never completes
/// stalls the lane that awaits it, and with it every key routed to that lane.
pub trait BackingStore<K, V>: Send + Sync + 'static {
  /// Looks up `key`. Resolves to `Ok(None)` if the store has no value for it.
  fn fetch<'a>(&'a self, key: &'a K) -> BoxFuture<'a, Result<Option<V>, BoxError>>;

  /// Durably records `value` under `key`.
  fn persist<'a>(&'a self, key: &'a K, value: &'a V) -> BoxFuture<'a, Result<(), BoxError>>;
}

/// When a `set` reaches the backing store relative to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PersistenceMode {
  /// The value is persisted first. The cache only changes once the backing
  /// store acknowledges, and a failed persist leaves the cache untouched.
  #[default]
  WriteThrough,
  /// The cache changes immediately and the persist runs detached. Its failure
  /// is logged and counted but not reported to the caller.
  WriteBack,
}

impl fmt::Display for PersistenceMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PersistenceMode::WriteThrough => write!(f, "write-through"),
      PersistenceMode::WriteBack => write!(f, "write-back"),
    }
  }
}

impl FromStr for PersistenceMode {
  type Err = BuildError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized: String = s
      .trim()
      .chars()
      .filter(|c| !matches!(c, '_' | '-' | ' '))
      .collect::<String>()
      .to_ascii_lowercase();
    match normalized.as_str() {
      "writethrough" => Ok(PersistenceMode::WriteThrough),
      "writeback" => Ok(PersistenceMode::WriteBack),
      _ => Err(BuildError::InvalidConfiguration(format!(
        "unknown persistence mode '{}'",
        s.trim()
      ))),
    }
  }
}

/// A `BackingStore` held entirely in memory.
///
/// Every future it returns is already complete.
pub struct InMemoryStore<K, V> {
  map: RwLock<HashMap<K, V>>,
}

impl<K, V> fmt::Debug for InMemoryStore<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("InMemoryStore")
      .field("len", &self.map.read().len())
      .finish()
  }
}

impl<K, V> Default for InMemoryStore<K, V> {
  fn default() -> Self {
    Self {
      map: RwLock::new(HashMap::new()),
    }
  }
}

impl<K: Eq + Hash, V: Clone> InMemoryStore<K, V> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seeds the store without going through a cache.
  pub fn insert(&self, key: K, value: V) {
    self.map.write().insert(key, value);
  }

  /// Reads the stored value directly.
  pub fn get(&self, key: &K) -> Option<V> {
    self.map.read().get(key).cloned()
  }

  pub fn len(&self) -> usize {
    self.map.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.map.read().is_empty()
  }
}

impl<K, V> BackingStore<K, V> for InMemoryStore<K, V>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Clone + Send + Sync + 'static,
{
  fn fetch<'a>(&'a self, key: &'a K) -> BoxFuture<'a, Result<Option<V>, BoxError>> {
    Box::pin(future::ready(Ok(self.get(key))))
  }

  fn persist<'a>(&'a self, key: &'a K, value: &'a V) -> BoxFuture<'a, Result<(), BoxError>> {
    self.insert(key.clone(), value.clone());
    Box::pin(future::ready(Ok(())))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_persistence_mode_names() {
    for name in ["WriteThrough", "write_through", "write-through", "WRITETHROUGH"] {
      assert_eq!(name.parse::<PersistenceMode>().unwrap(), PersistenceMode::WriteThrough);
    }
    for name in ["WriteBack", "write_back", " write-back "] {
      assert_eq!(name.parse::<PersistenceMode>().unwrap(), PersistenceMode::WriteBack);
    }
    assert!(matches!(
      "write-around".parse::<PersistenceMode>(),
      Err(BuildError::InvalidConfiguration(_))
    ));
  }

  #[tokio::test]
  async fn in_memory_store_round_trips() {
    let store = InMemoryStore::new();
    assert_eq!(store.fetch(&"k").await.unwrap(), None);
    store.persist(&"k", &5).await.unwrap();
    assert_eq!(store.fetch(&"k").await.unwrap(), Some(5));
    assert_eq!(store.len(), 1);
  }
}
