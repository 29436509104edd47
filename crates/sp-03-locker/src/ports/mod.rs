//! Ports: the key/value store the locker persists queues in.

pub mod store;

pub use store::{KeyValueStore, StoreError};
