//! Domain layer: lock records, the queue state machine, configuration.

pub mod config;
pub mod queue;
pub mod record;

pub use config::{CorruptQueuePolicy, LockerConfig};
pub use queue::{LockQueue, Released};
pub use record::{LockKey, LockRecord, LockStatus};
