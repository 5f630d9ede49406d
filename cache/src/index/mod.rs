//! Ordered secondary indices over the resident records.
//!
//! Both indices hold keys, never values. A key resident in the store has
//! exactly one entry in each index, filed under the record's current load time
//! and metadata snapshot respectively.

pub(crate) mod expiry;
pub(crate) mod priority;

pub(crate) use expiry::ExpiryIndex;
pub(crate) use priority::PriorityIndex;
