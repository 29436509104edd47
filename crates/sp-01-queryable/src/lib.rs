//! # Queryable Subsystem
//!
//! SQL helpers for services backed by a relational store.
//!
//! ## Purpose
//!
//! - Build SQL fragments (`"field"=value`, quoted projections, `ORDER BY`).
//! - Run statements through a [`QueryableContext`] that is bound either to the
//!   top-level [`Database`] or to an active [`Transaction`], never both.
//! - Wrap units of work in begin/commit/rollback envelopes.
//!
//! ## Transaction Lifecycle
//!
//! ```text
//! holder bound to Database
//!        │ run_in_transaction()
//!        ▼
//! holder bound to Transaction ──work Ok──→ COMMIT ──→ holder bound to Database
//!        │                                   │
//!        └──work Err──→ ROLLBACK ────────────┴──────→ holder bound to Database
//! ```
//!
//! The holder is rebound to the database handle on every exit path, so it is
//! never left pointing at a finished transaction.
//!
//! ## Request-Scoped Override
//!
//! Context-aware calls (`*_in`) take a [`RequestContext`]. When it carries a
//! queryable, that queryable serves the call; otherwise the receiver's own
//! binding does. The override is passed explicitly down the call chain.
//!
//! ## Module Structure
//!
//! ```text
//! domain/    - fragments, Order, Entity, QueryError
//! ports/     - Queryable, FromRow, RebindQueryable
//! adapters/  - SQLite Database/Transaction, QueryableContext, RequestContext
//! service.rs - transaction runners
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
pub use service::{run_always_rollback, run_in_transaction, run_in_transaction_with_db, RunError};
