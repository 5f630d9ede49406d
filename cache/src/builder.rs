use crate::backing::{BackingStore, PersistenceMode};
use crate::config::{CacheConfig, DEFAULT_CAPACITY, DEFAULT_EXPIRY_MILLIS, DEFAULT_LANES};
use crate::engine::{EngineSettings, EvictionEngine};
use crate::error::BuildError;
use crate::handles::Cache;
use crate::policy::OrderingPolicy;
use crate::runtime::TokioSpawner;
use crate::task::notifier::Notifier;
use crate::{time, EvictionListener, TaskSpawner};

use core::fmt;
use std::hash::{BuildHasher, Hash};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

/// A builder for creating `Cache` instances.
pub struct CacheBuilder<K: Send, V: Send, H = ahash::RandomState> {
  pub(crate) capacity: usize,
  pub(crate) lanes: usize,
  pub(crate) time_to_live: Duration,
  pub(crate) eviction_policy: OrderingPolicy,
  pub(crate) persistence_mode: PersistenceMode,
  pub(crate) reset_frequency_on_overwrite: bool,
  pub(crate) hasher: H,
  listener: Option<Arc<dyn EvictionListener<K, V>>>,
  spawner: Option<Arc<dyn TaskSpawner>>,
  _key_marker: PhantomData<K>,
  _value_marker: PhantomData<V>,
}

// Manual Debug implementation for CacheBuilder.
impl<K: Send, V: Send, H> fmt::Debug for CacheBuilder<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("capacity", &self.capacity)
      .field("lanes", &self.lanes)
      .field("time_to_live", &self.time_to_live)
      .field("eviction_policy", &self.eviction_policy)
      .field("persistence_mode", &self.persistence_mode)
      .field("reset_frequency_on_overwrite", &self.reset_frequency_on_overwrite)
      .field("has_listener", &self.listener.is_some())
      .finish_non_exhaustive()
  }
}

// --- General Configuration Methods ---
// This impl block has no restrictive bounds on K or V.
impl<K: Send, V: Send, H> CacheBuilder<K, V, H> {
  /// Sets the maximum number of resident entries. Inserting past it evicts
  /// the least valuable entry first.
  pub fn capacity(mut self, capacity: usize) -> Self {
    self.capacity = capacity;
    self
  }

  /// Sets the number of execution lanes keys are spread over.
  pub fn lanes(mut self, lanes: usize) -> Self {
    self.lanes = lanes;
    self
  }

  /// Sets the time-to-live applied to every entry from its load time.
  pub fn time_to_live(mut self, duration: Duration) -> Self {
    self.time_to_live = duration;
    self
  }

  /// Selects how entries are ranked for capacity eviction.
  pub fn eviction_policy(mut self, policy: OrderingPolicy) -> Self {
    self.eviction_policy = policy;
    self
  }

  /// Selects when a `set` reaches the backing store.
  pub fn persistence_mode(mut self, mode: PersistenceMode) -> Self {
    self.persistence_mode = mode;
    self
  }

  /// When `true`, overwriting a resident key restarts its access frequency
  /// instead of adding to it. Only observable under
  /// `OrderingPolicy::Frequency`.
  pub fn reset_frequency_on_overwrite(mut self, reset: bool) -> Self {
    self.reset_frequency_on_overwrite = reset;
    self
  }

  /// Sets the eviction listener for the cache.
  pub fn eviction_listener<Listener>(mut self, listener: Listener) -> Self
  where
    Listener: EvictionListener<K, V> + 'static,
  {
    self.listener = Some(Arc::new(listener));
    self
  }

  /// Applies every option of a declarative configuration.
  ///
  /// Unknown policy or mode names fail here rather than on first use.
  pub fn with_config(self, config: &CacheConfig) -> Result<Self, BuildError> {
    let policy: OrderingPolicy = config.eviction_policy.parse()?;
    let mode: PersistenceMode = config.persistence_mode.parse()?;
    Ok(
      self
        .eviction_policy(policy)
        .persistence_mode(mode)
        .time_to_live(Duration::from_millis(config.expiry_millis))
        .capacity(config.capacity)
        .lanes(config.lane_count)
        .reset_frequency_on_overwrite(config.reset_frequency_on_overwrite),
    )
  }

  /// Sets the runtime the lanes and their write-back queues are spawned on.
  ///
  /// Defaults to the Tokio runtime `build` is called from.
  pub fn spawner(mut self, spawner: Arc<dyn TaskSpawner>) -> Self {
    self.spawner = Some(spawner);
    self
  }
}

// --- Default Constructor ---
impl<K: Send, V: Send, H: BuildHasher + Default> CacheBuilder<K, V, H> {
  /// Creates a new `CacheBuilder` with default settings.
  pub fn new() -> Self {
    Self {
      capacity: DEFAULT_CAPACITY,
      lanes: DEFAULT_LANES,
      time_to_live: Duration::from_millis(DEFAULT_EXPIRY_MILLIS),
      eviction_policy: OrderingPolicy::default(),
      persistence_mode: PersistenceMode::default(),
      reset_frequency_on_overwrite: false,
      hasher: H::default(),
      listener: None,
      spawner: None,
      _key_marker: PhantomData,
      _value_marker: PhantomData,
    }
  }
}

impl<K: Send, V: Send> Default for CacheBuilder<K, V, ahash::RandomState> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K: Send, V: Send> CacheBuilder<K, V, ahash::RandomState> {
  /// Creates a builder with the default hasher from a declarative
  /// configuration.
  pub fn from_config(config: &CacheConfig) -> Result<Self, BuildError> {
    Self::new().with_config(config)
  }
}

// --- Build Methods ---
impl<K, V, H> CacheBuilder<K, V, H>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
  H: BuildHasher + Clone + Send + Sync + 'static,
{
  /// Sets the hasher used to route keys to lanes and store shards.
  pub fn hasher(mut self, hasher: H) -> Self {
    self.hasher = hasher;
    self
  }

  /// Builds a `Cache` in front of `backing`.
  ///
  /// Spawns the cache's lanes, so it must be called from within a Tokio
  /// runtime unless a custom spawner was set.
  pub fn build<S>(mut self, backing: Arc<S>) -> Result<Cache<K, V, S, H>, BuildError>
  where
    S: BackingStore<K, V>,
  {
    self.validate()?;

    let spawner: Arc<dyn TaskSpawner> = match self.spawner.take() {
      Some(spawner) => spawner,
      None => Arc::new(TokioSpawner::try_current().ok_or(BuildError::SpawnerRequired)?),
    };
    let notifier = self.listener.take().map(Notifier::spawn);

    let settings = EngineSettings {
      policy: self.eviction_policy,
      ttl: time::to_ticks(self.time_to_live),
      capacity: self.capacity,
      reset_frequency_on_overwrite: self.reset_frequency_on_overwrite,
    };
    debug!(
      policy = %self.eviction_policy,
      mode = %self.persistence_mode,
      capacity = self.capacity,
      lanes = self.lanes,
      ttl_ms = self.time_to_live.as_millis() as u64,
      "building cache"
    );

    let engine = EvictionEngine::new(
      settings,
      self.lanes,
      self.hasher,
      backing,
      spawner,
      notifier,
    );

    Ok(Cache {
      shared: Arc::new(engine),
      mode: self.persistence_mode,
    })
  }

  /// Validates the builder configuration.
  pub(crate) fn validate(&self) -> Result<(), BuildError> {
    if self.capacity == 0 {
      return Err(BuildError::ZeroCapacity);
    }
    if self.lanes == 0 {
      return Err(BuildError::ZeroLanes);
    }
    if self.time_to_live.is_zero() {
      return Err(BuildError::ZeroExpiry);
    }
    Ok(())
  }
}
