//! Key/value store port.

use async_trait::async_trait;
use thiserror::Error;

/// Failure talking to a key/value store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Byte-valued store with conditional writes. Values never expire.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Check connectivity.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Current value, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Unconditional write.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Remove `key`. Returns whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Replace the value only if it still equals `expected` (`None`: absent).
    /// A `new` of `None` deletes the key. Returns whether the swap happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<Vec<u8>>,
    ) -> Result<bool, StoreError>;
}
