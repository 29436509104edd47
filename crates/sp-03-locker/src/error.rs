//! Error types for the locker.

use crate::ports::StoreError;
use shared_types::{DomainError, ErrorKind};
use thiserror::Error;
use uuid::Uuid;

/// Locker failure.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Lock queue at {key} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode lock queue: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Lock queue at {key} still contended after {attempts} attempts")]
    Contention { key: String, attempts: u32 },

    #[error("No record with ticket {ticket} in lock queue at {key}")]
    TicketNotFound { key: String, ticket: Uuid },
}

impl LockError {
    /// Classification for callers translating failures into responses.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Store(StoreError::Unavailable(_)) => ErrorKind::ServiceUnavailable,
            Self::Contention { .. } => ErrorKind::Locked,
            Self::TicketNotFound { .. } => ErrorKind::NotFound,
            Self::Store(_) | Self::Corrupt { .. } | Self::Encode(_) => {
                ErrorKind::InternalServerError
            }
        }
    }
}

impl From<LockError> for DomainError {
    fn from(err: LockError) -> Self {
        let message = match &err {
            LockError::Store(_) => "lock_store_failed",
            LockError::Corrupt { .. } | LockError::Encode(_) => "lock_queue_invalid",
            LockError::Contention { .. } => "lock_contended",
            LockError::TicketNotFound { .. } => "lock_ticket_not_found",
        };
        DomainError::new(&err, err.kind(), message)
    }
}
