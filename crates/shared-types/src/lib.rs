//! # Shared Types Crate
//!
//! Types shared across the starter-pack crates.
//!
//! ## Contents
//!
//! - **Status Taxonomy**: [`ErrorKind`] maps symbolic names to HTTP-status-like
//!   integer codes (`0 = BadRequest` … `37 = NetworkAuthenticationRequired`).
//! - **Domain Errors**: [`DomainError`] tags an underlying failure with a kind
//!   and a machine-readable message. Callers map kind → response themselves.
//! - **Clock**: [`TimeSource`] so time-dependent logic (lock timestamps,
//!   replay start points) can be driven deterministically in tests.

pub mod clock;
pub mod errors;

pub use clock::{FixedTimeSource, SystemTimeSource, TimeSource};
pub use errors::{DomainError, ErrorKind};
