//! Configuration for the locker

use serde::{Deserialize, Serialize};

/// What to do with a stored value that is not a valid lock queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptQueuePolicy {
    /// Log a warning and treat the queue as empty; the next write replaces
    /// the corrupt value.
    #[default]
    TreatAsEmpty,
    /// Fail the operation with `LockError::Corrupt`.
    Fail,
}

/// Locker configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockerConfig {
    /// Handling of undecodable queues.
    pub corrupt_queue: CorruptQueuePolicy,
    /// Compare-and-swap attempts per operation before giving up.
    pub max_cas_attempts: u32,
    /// Promotions are announced on `{prefix}.{key}.promoted` when a
    /// notifier is attached.
    pub notification_prefix: String,
}

impl Default for LockerConfig {
    fn default() -> Self {
        Self {
            corrupt_queue: CorruptQueuePolicy::TreatAsEmpty,
            max_cas_attempts: 16,
            notification_prefix: "locker".to_string(),
        }
    }
}

impl LockerConfig {
    /// Subject promotions for `key` are published to.
    pub fn promotion_subject(&self, key: &str) -> String {
        format!("{}.{key}.promoted", self.notification_prefix)
    }
}
