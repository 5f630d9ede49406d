use once_cell::sync::Lazy;
use std::time::{Duration, Instant};

// The single, static reference point for all timestamps kept by the cache.
// It is initialized lazily on its first use.
static CACHE_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// A point in time, in nanoseconds since the cache epoch.
///
/// Monotonic, so load times and access times can be compared and ordered
/// without wall-clock adjustments leaking into eviction order.
pub(crate) type Timestamp = u64;

/// Returns the current time as nanoseconds since the epoch.
#[inline]
pub(crate) fn now() -> Timestamp {
  Instant::now()
    .saturating_duration_since(*CACHE_EPOCH)
    .as_nanos() as Timestamp
}

/// Converts a `Duration` into the same unit as `Timestamp`.
#[inline]
pub(crate) fn to_ticks(duration: Duration) -> u64 {
  u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
