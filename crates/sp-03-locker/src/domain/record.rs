//! Lock records and their storage key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Position of a record in its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockStatus {
    /// Holds the lock (queue head).
    Locked,
    /// Waiting behind the head.
    Pending,
}

/// One entry of a lock queue.
///
/// Stored as `{"timestamp", "data", "status", "ticket"}`. Records written
/// without a ticket read back with the nil UUID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Unix seconds when the record was queued.
    pub timestamp: u64,
    /// Caller payload.
    pub data: Value,
    /// Locked or pending.
    pub status: LockStatus,
    /// Identifies the record for release.
    #[serde(default)]
    pub ticket: Uuid,
}

/// `{domain}-{function}-{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey {
    pub domain: String,
    pub function: String,
    pub id: String,
}

impl LockKey {
    pub fn new(domain: impl Into<String>, function: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            function: function.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.domain, self.function, self.id)
    }
}
