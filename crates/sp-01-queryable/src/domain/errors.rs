//! Errors raised by queryables and transactions.

use shared_types::{DomainError, ErrorKind};
use thiserror::Error;

/// Failure of a SQL call or of transaction bookkeeping.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The driver rejected the statement or the row mapping.
    #[error(transparent)]
    Sql(#[from] rusqlite::Error),

    /// The transaction has already been committed or rolled back.
    #[error("Transaction already finished")]
    TransactionClosed,

    /// A transaction is already open on this connection.
    #[error("A transaction is already in progress on this connection")]
    TransactionInProgress,

    /// Commit/rollback of a runner-owned transaction was attempted by the
    /// unit of work.
    #[error("Transaction is managed by its runner and cannot be finished directly")]
    ManagedTransaction,

    /// The request deadline passed before the statement ran.
    #[error("Request deadline exceeded")]
    DeadlineExceeded,
}

impl QueryError {
    /// Classification for callers translating failures into responses.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Sql(rusqlite::Error::QueryReturnedNoRows) => ErrorKind::NotFound,
            Self::Sql(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                ErrorKind::Conflict
            }
            Self::TransactionInProgress => ErrorKind::Conflict,
            Self::DeadlineExceeded => ErrorKind::RequestTimeout,
            _ => ErrorKind::InternalServerError,
        }
    }

    /// True when a single-row query found nothing.
    #[must_use]
    pub fn is_no_rows(&self) -> bool {
        matches!(self, Self::Sql(rusqlite::Error::QueryReturnedNoRows))
    }
}

impl From<QueryError> for DomainError {
    fn from(err: QueryError) -> Self {
        let message = match err.kind() {
            ErrorKind::NotFound => "record_not_found",
            ErrorKind::Conflict => "record_conflict",
            ErrorKind::RequestTimeout => "query_deadline_exceeded",
            _ => "query_failed",
        };
        DomainError::new(&err, err.kind(), message)
    }
}
