//! # Locker Service
//!
//! Read-modify-write of lock queues with compare-and-swap retries.

use crate::domain::{CorruptQueuePolicy, LockKey, LockQueue, LockRecord, LockerConfig, Released};
use crate::error::LockError;
use crate::ports::KeyValueStore;
use serde_json::Value;
use shared_bus::MessageBroker;
use shared_types::{SystemTimeSource, TimeSource};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Queue-based advisory locker.
pub struct Locker {
    store: Arc<dyn KeyValueStore>,
    config: LockerConfig,
    clock: Arc<dyn TimeSource>,
    notifier: Option<Arc<dyn MessageBroker>>,
}

/// A queue as read from the store, with the raw bytes the next write must
/// still find there.
struct Snapshot {
    raw: Option<Vec<u8>>,
    queue: LockQueue,
}

impl Locker {
    /// Connect to `store`, failing if it does not answer a ping.
    pub async fn connect(
        store: Arc<dyn KeyValueStore>,
        config: LockerConfig,
    ) -> Result<Self, LockError> {
        if let Err(e) = store.ping().await {
            error!(error = %e, "Lock store ping failed");
            return Err(e.into());
        }
        Ok(Self {
            store,
            config,
            clock: Arc::new(SystemTimeSource),
            notifier: None,
        })
    }

    /// Replace the clock used for record timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Announce promotions on `broker`.
    #[must_use]
    pub fn with_notifier(mut self, broker: Arc<dyn MessageBroker>) -> Self {
        self.notifier = Some(broker);
        self
    }

    pub fn config(&self) -> &LockerConfig {
        &self.config
    }

    /// Append a record for `(domain, function, id)`.
    ///
    /// The record is `locked` if the queue was empty, `pending` otherwise.
    /// Keep its ticket to release it later.
    pub async fn acquire_or_queue(
        &self,
        domain: &str,
        function: &str,
        id: &str,
        data: Value,
    ) -> Result<LockRecord, LockError> {
        let key = LockKey::new(domain, function, id).to_string();
        let ticket = Uuid::new_v4();

        let record = self
            .update(&key, |queue| {
                Ok(queue.push(self.clock.unix_secs(), data.clone(), ticket))
            })
            .await?;

        info!(key = %key, ticket = %ticket, status = ?record.status, "Queued lock record");
        Ok(record)
    }

    /// Remove the record with `ticket`.
    ///
    /// Returns the record promoted to `locked` when the holder released.
    pub async fn release(
        &self,
        domain: &str,
        function: &str,
        id: &str,
        ticket: Uuid,
    ) -> Result<Option<LockRecord>, LockError> {
        let key = LockKey::new(domain, function, id).to_string();

        let Released { removed, promoted } = self
            .update(&key, |queue| {
                queue.release(ticket).ok_or_else(|| LockError::TicketNotFound {
                    key: key.clone(),
                    ticket,
                })
            })
            .await?;

        info!(key = %key, ticket = %ticket, status = ?removed.status, "Released lock record");
        if let Some(next) = &promoted {
            self.announce(&key, next).await;
        }
        Ok(promoted)
    }

    /// Every record queued for `(domain, function, id)`, head first.
    pub async fn queue(
        &self,
        domain: &str,
        function: &str,
        id: &str,
    ) -> Result<Vec<LockRecord>, LockError> {
        let key = LockKey::new(domain, function, id).to_string();
        Ok(self.load(&key).await?.queue.into_records())
    }

    /// The record currently holding the lock.
    pub async fn holder(
        &self,
        domain: &str,
        function: &str,
        id: &str,
    ) -> Result<Option<LockRecord>, LockError> {
        let key = LockKey::new(domain, function, id).to_string();
        Ok(self.load(&key).await?.queue.holder().cloned())
    }

    async fn load(&self, key: &str) -> Result<Snapshot, LockError> {
        let raw = self.store.get(key).await?;
        let queue = match raw.as_deref() {
            None => LockQueue::default(),
            Some(bytes) => match LockQueue::decode(bytes) {
                Ok(queue) => queue,
                Err(source) => match self.config.corrupt_queue {
                    CorruptQueuePolicy::TreatAsEmpty => {
                        warn!(key, error = %source, "Corrupt lock queue treated as empty");
                        LockQueue::default()
                    }
                    CorruptQueuePolicy::Fail => {
                        return Err(LockError::Corrupt {
                            key: key.to_string(),
                            source,
                        })
                    }
                },
            },
        };
        Ok(Snapshot { raw, queue })
    }

    /// Apply `mutate` to the stored queue and write it back with
    /// compare-and-swap, retrying on conflict.
    async fn update<T>(
        &self,
        key: &str,
        mut mutate: impl FnMut(&mut LockQueue) -> Result<T, LockError> + Send,
    ) -> Result<T, LockError> {
        let attempts = self.config.max_cas_attempts.max(1);

        for attempt in 1..=attempts {
            let Snapshot { raw, mut queue } = self.load(key).await?;
            let out = mutate(&mut queue)?;

            let new = if queue.is_empty() {
                None
            } else {
                Some(queue.encode().map_err(LockError::Encode)?)
            };

            if self.store.compare_and_swap(key, raw.as_deref(), new).await? {
                return Ok(out);
            }
            debug!(key, attempt, "Lock queue changed concurrently, retrying");
            tokio::task::yield_now().await;
        }

        warn!(key, attempts, "Lock queue contention budget exhausted");
        Err(LockError::Contention {
            key: key.to_string(),
            attempts,
        })
    }

    async fn announce(&self, key: &str, record: &LockRecord) {
        let Some(broker) = &self.notifier else {
            return;
        };
        let subject = self.config.promotion_subject(key);
        match serde_json::to_vec(record) {
            Ok(payload) => {
                if let Err(e) = broker.publish(&subject, payload).await {
                    warn!(subject = %subject, error = %e, "Failed to announce promotion");
                }
            }
            Err(e) => warn!(subject = %subject, error = %e, "Failed to encode promotion"),
        }
    }
}
