//! Background tasks that run beside the cache's lanes.

pub(crate) mod notifier;
pub(crate) mod persister;
