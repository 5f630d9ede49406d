//! Eviction ordering.
//!
//! An `OrderingPolicy` decides which resident entry is the least valuable when
//! the cache is at capacity. It is a pure comparator over `AccessMetadata`,
//! picked once when the cache is built.

use crate::entry::AccessMetadata;
use crate::error::BuildError;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Selects how entries are ranked for capacity eviction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderingPolicy {
  /// Least recently used: the entry with the oldest `last_access` goes first.
  #[default]
  Recency,
  /// Least frequently used: the entry with the lowest `frequency` goes first,
  /// and among equally frequent entries the one accessed longest ago.
  Frequency,
}

impl OrderingPolicy {
  /// Orders two metadata snapshots from least to most valuable.
  ///
  /// `Ordering::Less` means `a` is evicted before `b`.
  pub fn compare(&self, a: &AccessMetadata, b: &AccessMetadata) -> Ordering {
    match self {
      OrderingPolicy::Recency => a.last_access.cmp(&b.last_access),
      OrderingPolicy::Frequency => a
        .frequency
        .cmp(&b.frequency)
        .then_with(|| a.last_access.cmp(&b.last_access)),
    }
  }

  /// Wraps a snapshot so it can key an ordered map under this policy.
  #[inline]
  pub(crate) fn key(&self, metadata: AccessMetadata) -> PriorityKey {
    PriorityKey {
      metadata,
      policy: *self,
    }
  }
}

impl fmt::Display for OrderingPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      OrderingPolicy::Recency => write!(f, "LRU"),
      OrderingPolicy::Frequency => write!(f, "LFU"),
    }
  }
}

impl FromStr for OrderingPolicy {
  type Err = BuildError;

  /// Accepts `LRU`/`Recency` and `LFU`/`Frequency`, ignoring case.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "lru" | "recency" => Ok(OrderingPolicy::Recency),
      "lfu" | "frequency" => Ok(OrderingPolicy::Frequency),
      other => Err(BuildError::InvalidConfiguration(format!(
        "unknown eviction policy '{}'",
        other
      ))),
    }
  }
}

/// A metadata snapshot ordered by the policy it was created under.
///
/// Two keys compare equal when the policy cannot tell them apart, which is
/// what lets the priority index bucket ties together.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PriorityKey {
  pub(crate) metadata: AccessMetadata,
  policy: OrderingPolicy,
}

impl PartialEq for PriorityKey {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for PriorityKey {}

impl PartialOrd for PriorityKey {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for PriorityKey {
  fn cmp(&self, other: &Self) -> Ordering {
    self.policy.compare(&self.metadata, &other.metadata)
  }
}
