//! # Starter-Pack Test Suite
//!
//! Flows that cross crate boundaries. Per-crate behaviour is tested inside
//! each crate.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── reservation_flow.rs  # runner + locker + begin/commit events
//!     ├── lock_handoff.rs      # promotion notices read by a durable subscriber
//!     └── bootstrap.rs         # logging init and secret-store fallbacks
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sp-tests
//! cargo test -p sp-tests integration::lock_handoff
//! ```

pub mod integration;
