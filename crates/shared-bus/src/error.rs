//! Broker error types.

use thiserror::Error;

/// Errors from broker operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The broker was closed.
    #[error("Broker closed")]
    Closed,

    /// The subject is empty or contains whitespace.
    #[error("Invalid subject: {0:?}")]
    InvalidSubject(String),

    /// A durable name was supplied but is empty.
    #[error("Invalid durable name for subject {subject}")]
    InvalidDurableName { subject: String },

    /// A non-grouped durable subscription is already active under this name.
    #[error("Duplicate durable registration: {durable} on {subject}")]
    DuplicateDurable { subject: String, durable: String },
}
