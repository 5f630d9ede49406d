//! Per-key execution lanes.
//!
//! Every key hashes to one of a fixed number of lanes. A lane is a single task
//! draining an unbounded queue and running each job to completion before it
//! starts the next one, so all operations on a key run one at a time in the
//! order they were submitted. Unrelated keys on different lanes run in
//! parallel.

use crate::error::CacheError;
use crate::store::hash_key;
use crate::TaskSpawner;

use std::fmt;
use std::future::Future;
use std::hash::{BuildHasher, Hash};
use std::panic::AssertUnwindSafe;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

/// Identifies one of the router's lanes.
pub type LaneId = usize;

type Job = BoxFuture<'static, ()>;

/// The submitting half of a lane. The lane task exits once this is dropped
/// and its queue is drained.
struct Lane {
  tx: mpsc::UnboundedSender<Job>,
}

/// Routes keys to lanes and submits work to them.
pub(crate) struct ShardRouter<H> {
  lanes: Box<[Lane]>,
  hasher: H,
}

impl<H> fmt::Debug for ShardRouter<H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ShardRouter")
      .field("lanes", &self.lanes.len())
      .finish()
  }
}

impl<H: BuildHasher> ShardRouter<H> {
  /// Spawns `lane_count` lane tasks on `spawner`.
  pub(crate) fn spawn(lane_count: usize, hasher: H, spawner: &dyn TaskSpawner) -> Self {
    let lanes = (0..lane_count)
      .map(|id| {
        let (tx, rx) = mpsc::unbounded_channel();
        spawner.spawn(Box::pin(run_lane(id, rx)));
        Lane { tx }
      })
      .collect::<Vec<_>>();

    Self {
      lanes: lanes.into_boxed_slice(),
      hasher,
    }
  }

  /// The lane that owns `key`. Stable for the lifetime of the router.
  #[inline]
  pub(crate) fn lane_for<K: Hash + ?Sized>(&self, key: &K) -> LaneId {
    (hash_key(&self.hasher, &key) % self.lanes.len() as u64) as LaneId
  }

  pub(crate) fn lane_count(&self) -> usize {
    self.lanes.len()
  }

  /// Queues `task` on `lane` and returns a future resolving to its output.
  ///
  /// The task is enqueued before this returns, so two calls made in sequence
  /// run in that sequence even if their futures are polled out of order.
  pub(crate) fn submit<T, F>(
    &self,
    lane: LaneId,
    task: F,
  ) -> impl Future<Output = Result<T, CacheError>> + Send + 'static
  where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
  {
    let (reply_tx, reply_rx) = oneshot::channel();
    let job: Job = Box::pin(async move {
      // The caller may have given up waiting; the work still counts.
      let _ = reply_tx.send(task.await);
    });
    let queued = self.lanes[lane].tx.send(job).is_ok();

    async move {
      if !queued {
        return Err(CacheError::LaneClosed { lane });
      }
      reply_rx.await.map_err(|_| CacheError::LaneClosed { lane })
    }
  }
}

/// The body of a lane task.
async fn run_lane(id: LaneId, mut rx: mpsc::UnboundedReceiver<Job>) {
  debug!(lane = id, "cache lane started");
  while let Some(job) = rx.recv().await {
    // A panicking job must not take the lane, and every key routed to it,
    // down with it. Its caller observes the dropped reply instead.
    if AssertUnwindSafe(job).catch_unwind().await.is_err() {
      error!(lane = id, "cache operation panicked");
    }
  }
  debug!(lane = id, "cache lane stopped");
}
