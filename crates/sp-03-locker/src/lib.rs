//! # Locker Subsystem
//!
//! Advisory locks kept as an ordered queue of records per
//! `(domain, function, id)` key in a key/value store.
//!
//! ## State Machine
//!
//! ```text
//!            acquire                 acquire
//! [Empty] ──────────→ [Locked] ─────────────→ [Locked + Pending…]
//!    ▲                   │  ▲                        │
//!    │ release head      │  └── release head ────────┘
//!    └───────────────────┘      (next pending is promoted to locked)
//! ```
//!
//! - The head of a non-empty queue is the only `locked` record.
//! - Releasing a pending record cancels it without touching the head.
//! - An emptied queue deletes its key.
//!
//! ## Concurrency
//!
//! Every update is a read-modify-write committed with compare-and-swap, so
//! concurrent acquires on one key never lose records. A write that keeps
//! losing the race fails with [`LockError::Contention`] once the configured
//! attempt budget is spent.
//!
//! ## Corrupt Values
//!
//! A stored value that does not decode as a queue is handled per
//! [`CorruptQueuePolicy`]: treated as empty (and overwritten on the next
//! write) or surfaced as [`LockError::Corrupt`].

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{InMemoryKeyValueStore, SqliteKeyValueStore};
pub use domain::{CorruptQueuePolicy, LockKey, LockQueue, LockRecord, LockStatus, LockerConfig, Released};
pub use error::LockError;
pub use ports::{KeyValueStore, StoreError};
pub use service::Locker;
