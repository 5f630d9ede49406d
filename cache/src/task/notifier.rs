use crate::listener::{EvictionListener, EvictionReason};

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use fibre::mpsc;
use fibre::TrySendError;
use tracing::warn;

/// A message sent to the notifier task.
pub(crate) type Notification<K, V> = (K, Arc<V>, EvictionReason);

/// A bounded MPSC channel for notifications.
const NOTIFICATION_CHANNEL_CAPACITY: usize = 1024;

/// The background task responsible for calling user-provided eviction listeners.
pub(crate) struct Notifier<K: Send, V: Send + Sync> {
  _handle: JoinHandle<()>,
  sender: mpsc::BoundedSender<Notification<K, V>>,
}

impl<K: Send, V: Send + Sync> Notifier<K, V> {
  /// Spawns a new notifier thread.
  pub(crate) fn spawn(listener: Arc<dyn EvictionListener<K, V>>) -> Self
  where
    K: 'static,
    V: 'static,
  {
    let (tx, rx): (
      mpsc::BoundedSender<Notification<K, V>>,
      mpsc::BoundedReceiver<Notification<K, V>>,
    ) = mpsc::bounded(NOTIFICATION_CHANNEL_CAPACITY);

    let handle = thread::spawn(move || {
      // Ends once the sender held by the notifier is dropped.
      while let Ok((key, value, reason)) = rx.recv() {
        listener.on_evict(key, value, reason);
      }
    });

    Self {
      _handle: handle,
      sender: tx,
    }
  }

  /// Queues a notification without blocking. Drops it if the listener has
  /// fallen too far behind.
  pub(crate) fn notify(&self, key: K, value: Arc<V>, reason: EvictionReason) {
    if let Err(err) = self.sender.try_send((key, value, reason)) {
      match err {
        TrySendError::Full(_) => warn!(%reason, "eviction listener is lagging, notification dropped"),
        _ => warn!(%reason, "eviction listener has stopped, notification dropped"),
      }
    }
  }
}
