use crate::backing::BackingStore;
use crate::metrics::Metrics;
use crate::router::LaneId;
use crate::TaskSpawner;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// A write-back persist waiting for its turn.
type PendingWrite<K, V> = (K, Arc<V>);

/// Ordered write-back queues, one per lane.
///
/// A lane hands its write-back values over here and moves on. Each queue
/// persists in the order values were handed over, so the backing store always
/// ends up with the last value set for a key, while the lane itself never
/// waits on the store.
pub(crate) struct Persister<K, V> {
  queues: Box<[mpsc::UnboundedSender<PendingWrite<K, V>>]>,
  metrics: Arc<Metrics>,
}

impl<K, V> Persister<K, V>
where
  K: Send + Sync + 'static,
  V: Send + Sync + 'static,
{
  /// Spawns one persist task per lane on `spawner`.
  pub(crate) fn spawn<S>(
    lanes: usize,
    backing: Arc<S>,
    metrics: Arc<Metrics>,
    spawner: &dyn TaskSpawner,
  ) -> Self
  where
    S: BackingStore<K, V>,
  {
    let queues = (0..lanes)
      .map(|lane| {
        let (tx, rx) = mpsc::unbounded_channel();
        spawner.spawn(Box::pin(run_persist_queue(
          lane,
          rx,
          Arc::clone(&backing),
          Arc::clone(&metrics),
        )));
        tx
      })
      .collect::<Vec<_>>();

    Self {
      queues: queues.into_boxed_slice(),
      metrics,
    }
  }

  /// Queues `value` to be persisted under `key` after everything already
  /// queued on `lane`.
  pub(crate) fn enqueue(&self, lane: LaneId, key: K, value: Arc<V>) {
    if self.queues[lane].send((key, value)).is_err() {
      Metrics::incr(&self.metrics.persist_failures);
      warn!(lane, "write-back queue has stopped, persist dropped");
    }
  }
}

async fn run_persist_queue<K, V, S>(
  lane: LaneId,
  mut rx: mpsc::UnboundedReceiver<PendingWrite<K, V>>,
  backing: Arc<S>,
  metrics: Arc<Metrics>,
) where
  S: BackingStore<K, V>,
{
  debug!(lane, "write-back queue started");
  while let Some((key, value)) = rx.recv().await {
    match AssertUnwindSafe(backing.persist(&key, &value))
      .catch_unwind()
      .await
    {
      Ok(Ok(())) => {}
      Ok(Err(err)) => {
        Metrics::incr(&metrics.persist_failures);
        warn!(lane, error = %err, "write-back persist failed");
      }
      Err(_) => {
        Metrics::incr(&metrics.persist_failures);
        error!(lane, "write-back persist panicked");
      }
    }
  }
  debug!(lane, "write-back queue stopped");
}
