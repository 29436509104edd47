//! # Queryable Context
//!
//! [`QueryableContext`] is bound to exactly one handle. [`RequestContext`]
//! carries per-request state (an override queryable and a deadline) down
//! the call chain explicitly.

use crate::adapters::sqlite::{Database, Transaction};
use crate::domain::QueryError;
use crate::ports::{FromRow, Queryable};
use rusqlite::Params;
use std::time::{Duration, Instant};

/// A queryable bound to either the database handle or one transaction.
#[derive(Debug, Clone)]
pub enum QueryableContext {
    /// Top-level database handle.
    Database(Database),
    /// An open transaction.
    Transaction(Transaction),
}

impl QueryableContext {
    /// The bound database handle, if not in a transaction.
    #[must_use]
    pub fn database(&self) -> Option<&Database> {
        match self {
            Self::Database(db) => Some(db),
            Self::Transaction(_) => None,
        }
    }

    /// The bound transaction, if any.
    #[must_use]
    pub fn transaction(&self) -> Option<&Transaction> {
        match self {
            Self::Transaction(tx) => Some(tx),
            Self::Database(_) => None,
        }
    }

    /// Whether this context routes through a transaction.
    #[must_use]
    pub fn is_transaction(&self) -> bool {
        matches!(self, Self::Transaction(_))
    }
}

impl From<Database> for QueryableContext {
    fn from(db: Database) -> Self {
        Self::Database(db)
    }
}

impl From<Transaction> for QueryableContext {
    fn from(tx: Transaction) -> Self {
        Self::Transaction(tx)
    }
}

impl Queryable for QueryableContext {
    fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize, QueryError> {
        match self {
            Self::Database(db) => db.execute(sql, params),
            Self::Transaction(tx) => tx.execute(sql, params),
        }
    }

    fn execute_batch(&self, sql: &str) -> Result<(), QueryError> {
        match self {
            Self::Database(db) => db.execute_batch(sql),
            Self::Transaction(tx) => tx.execute_batch(sql),
        }
    }

    fn query_one<T: FromRow, P: Params>(&self, sql: &str, params: P) -> Result<T, QueryError> {
        match self {
            Self::Database(db) => db.query_one(sql, params),
            Self::Transaction(tx) => tx.query_one(sql, params),
        }
    }

    fn query_many<T: FromRow, P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<T>, QueryError> {
        match self {
            Self::Database(db) => db.query_many(sql, params),
            Self::Transaction(tx) => tx.query_many(sql, params),
        }
    }

    fn prepare(&self, sql: &str) -> Result<PreparedStatement, QueryError> {
        match self {
            Self::Database(db) => db.prepare(sql),
            Self::Transaction(tx) => tx.prepare(sql),
        }
    }
}

/// A validated statement bound to the handle that prepared it.
///
/// Statement compilation is cached per connection, so re-running a
/// prepared statement does not re-parse the SQL.
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    sql: String,
    target: QueryableContext,
}

impl PreparedStatement {
    pub(crate) fn new(sql: &str, target: QueryableContext) -> Self {
        Self {
            sql: sql.to_string(),
            target,
        }
    }

    /// Statement text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Run with `params`.
    pub fn execute<P: Params>(&self, params: P) -> Result<usize, QueryError> {
        self.target.execute(&self.sql, params)
    }

    /// Read exactly one row.
    pub fn query_one<T: FromRow, P: Params>(&self, params: P) -> Result<T, QueryError> {
        self.target.query_one(&self.sql, params)
    }

    /// Read every row.
    pub fn query_many<T: FromRow, P: Params>(&self, params: P) -> Result<Vec<T>, QueryError> {
        self.target.query_many(&self.sql, params)
    }
}

/// Per-request state passed to the `*_in` query methods.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    queryable: Option<QueryableContext>,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Empty context: no override, no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Route queries through `queryable` instead of the receiver.
    #[must_use]
    pub fn with_queryable(mut self, queryable: impl Into<QueryableContext>) -> Self {
        self.queryable = Some(queryable.into());
        self
    }

    /// Fail queries started at or after `deadline`.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Fail queries started more than `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The override queryable, if set.
    #[must_use]
    pub fn queryable(&self) -> Option<&QueryableContext> {
        self.queryable.as_ref()
    }

    /// The deadline, if set.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `Err(DeadlineExceeded)` once the deadline has passed.
    pub fn check_deadline(&self) -> Result<(), QueryError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(QueryError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}
