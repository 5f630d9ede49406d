//! An in-process, bounded key-value cache in front of a backing store.
//!
//! # Features
//! - **Per-key ordering**: Every key is routed to one of a fixed number of
//!   execution lanes. Operations on a key run one at a time in submission
//!   order; unrelated keys on other lanes run in parallel.
//! - **Eviction**: Capacity eviction ranks entries by recency (LRU) or by
//!   frequency with a recency tie-break (LFU).
//! - **Expiry**: A time-to-live measured from load time. Stale entries are
//!   refetched on `get` and swept on `set`, with no background timer.
//! - **Persistence**: Write-through (the backing store acknowledges before the
//!   cache changes) or write-back (the cache changes first, persisting is
//!   detached).
//! - **Observability**: Metrics snapshots, eviction listeners and `tracing`
//!   events.
//!
//! ```no_run
//! use std::sync::Arc;
//! use lanecache::{CacheBuilder, InMemoryStore, OrderingPolicy};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryStore::new());
//! let cache = CacheBuilder::default()
//!   .capacity(1_000)
//!   .eviction_policy(OrderingPolicy::Frequency)
//!   .build(store)?;
//!
//! cache.set("answer", 42).await?;
//! assert_eq!(*cache.get("answer").await?, 42);
//! # Ok(())
//! # }
//! ```

// Public modules that form the API
pub mod backing;
pub mod builder;
pub mod config;
pub mod error;
pub mod handles;
pub mod listener;
pub mod metrics;
pub mod policy;
pub mod runtime;

// Internal, crate-only modules
mod engine;
mod entry;
mod index;
mod router;
mod store;
mod task;
mod time;

// Re-export the primary user-facing types for convenience
pub use backing::{BackingStore, InMemoryStore, PersistenceMode};
pub use builder::CacheBuilder;
pub use config::CacheConfig;
pub use entry::AccessMetadata;
pub use error::{BoxError, BuildError, CacheError};
pub use handles::Cache;
pub use listener::{EvictionListener, EvictionReason};
pub use metrics::MetricsSnapshot;
pub use policy::OrderingPolicy;
pub use router::LaneId;
pub use runtime::{TaskSpawner, TokioSpawner};
