use crate::entry::AccessMetadata;
use crate::policy::{OrderingPolicy, PriorityKey};

use std::collections::{BTreeMap, VecDeque};

/// Keys ordered by eviction priority, least valuable first.
///
/// Entries the policy ranks equally share a bucket and leave it in the order
/// they entered, so ties are evicted first-in first-out.
#[derive(Debug)]
pub(crate) struct PriorityIndex<K> {
  policy: OrderingPolicy,
  buckets: BTreeMap<PriorityKey, VecDeque<K>>,
  len: usize,
}

impl<K: Eq> PriorityIndex<K> {
  pub(crate) fn new(policy: OrderingPolicy) -> Self {
    Self {
      policy,
      buckets: BTreeMap::new(),
      len: 0,
    }
  }

  pub(crate) fn insert(&mut self, metadata: AccessMetadata, key: K) {
    self
      .buckets
      .entry(self.policy.key(metadata))
      .or_default()
      .push_back(key);
    self.len += 1;
  }

  /// Removes `key` from the bucket its `metadata` snapshot ranks into.
  /// Returns whether the key was indexed there.
  pub(crate) fn remove(&mut self, metadata: AccessMetadata, key: &K) -> bool {
    let priority = self.policy.key(metadata);
    let Some(bucket) = self.buckets.get_mut(&priority) else {
      return false;
    };
    let Some(position) = bucket.iter().position(|k| k == key) else {
      return false;
    };
    bucket.remove(position);
    if bucket.is_empty() {
      self.buckets.remove(&priority);
    }
    self.len -= 1;
    true
  }

  /// Removes and returns the least valuable key, if any.
  pub(crate) fn pop_lowest(&mut self) -> Option<K> {
    let mut entry = self.buckets.first_entry()?;
    let key = entry.get_mut().pop_front();
    if entry.get().is_empty() {
      entry.remove();
    }
    if key.is_some() {
      self.len -= 1;
    }
    key
  }

  #[cfg(test)]
  pub(crate) fn contains(&self, metadata: AccessMetadata, key: &K) -> bool {
    self
      .buckets
      .get(&self.policy.key(metadata))
      .is_some_and(|bucket| bucket.iter().filter(|k| *k == key).count() == 1)
  }

  pub(crate) fn len(&self) -> usize {
    self.len
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn meta(last_access: u64, frequency: u64) -> AccessMetadata {
    AccessMetadata {
      last_access,
      frequency,
    }
  }

  #[test]
  fn recency_pops_oldest_access_first() {
    let mut index = PriorityIndex::new(OrderingPolicy::Recency);
    index.insert(meta(30, 1), "c");
    index.insert(meta(10, 5), "a");
    index.insert(meta(20, 1), "b");

    assert_eq!(index.pop_lowest(), Some("a"));
    assert_eq!(index.pop_lowest(), Some("b"));
    assert_eq!(index.pop_lowest(), Some("c"));
    assert_eq!(index.pop_lowest(), None);
    assert_eq!(index.len(), 0);
  }

  #[test]
  fn frequency_pops_coldest_then_oldest() {
    let mut index = PriorityIndex::new(OrderingPolicy::Frequency);
    index.insert(meta(10, 3), "hot");
    index.insert(meta(20, 1), "young");
    index.insert(meta(15, 1), "old");

    assert_eq!(index.pop_lowest(), Some("old"));
    assert_eq!(index.pop_lowest(), Some("young"));
    assert_eq!(index.pop_lowest(), Some("hot"));
  }

  #[test]
  fn equal_ranks_are_kept_apart_and_popped_in_insertion_order() {
    let mut index = PriorityIndex::new(OrderingPolicy::Recency);
    index.insert(meta(5, 1), "first");
    index.insert(meta(5, 2), "second");
    assert_eq!(index.len(), 2);

    assert!(index.remove(meta(5, 2), &"second"));
    index.insert(meta(5, 3), "second");
    index.insert(meta(5, 1), "third");

    assert_eq!(index.pop_lowest(), Some("first"));
    assert_eq!(index.pop_lowest(), Some("second"));
    assert_eq!(index.pop_lowest(), Some("third"));
  }

  #[test]
  fn remove_requires_the_current_snapshot() {
    let mut index = PriorityIndex::new(OrderingPolicy::Frequency);
    index.insert(meta(1, 1), 42);
    assert!(!index.remove(meta(1, 2), &42));
    assert!(index.contains(meta(1, 1), &42));
    assert!(index.remove(meta(1, 1), &42));
    assert!(index.buckets.is_empty());
  }
}
