use thiserror::Error;

/// The error type backing stores report failures with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when building a cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// The cache was configured with a capacity of zero.
  #[error("cache capacity cannot be zero")]
  ZeroCapacity,
  /// The cache was configured with zero execution lanes.
  #[error("lane count cannot be zero")]
  ZeroLanes,
  /// The cache was configured with a zero time-to-live, which would expire
  /// every entry on load.
  #[error("expiry time cannot be zero")]
  ZeroExpiry,
  /// An eviction policy or persistence mode name was not recognized.
  #[error("invalid configuration: {0}")]
  InvalidConfiguration(String),
  /// No `TaskSpawner` was configured and the builder was not called from
  /// within a Tokio runtime.
  #[error("a task spawner or an active tokio runtime is required")]
  SpawnerRequired,
  /// A textual configuration could not be parsed.
  #[error("failed to parse configuration: {0}")]
  Config(String),
}

/// Errors returned by cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
  /// The key is absent from both the cache and the backing store.
  #[error("key not found in cache or backing store")]
  NotFound,
  /// The backing store failed to fetch or persist.
  #[error("backing store operation failed")]
  BackingStore(#[source] BoxError),
  /// The lane owning the key stopped or abandoned the request before
  /// answering.
  #[error("cache lane {lane} is shut down")]
  LaneClosed { lane: usize },
}

impl CacheError {
  /// Returns `true` if this is a `NotFound` error.
  pub fn is_not_found(&self) -> bool {
    matches!(self, CacheError::NotFound)
  }
}
