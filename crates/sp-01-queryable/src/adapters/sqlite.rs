//! # SQLite Adapter
//!
//! One connection shared behind a mutex. A [`Transaction`] is a handle on
//! that connection between `BEGIN IMMEDIATE` and `COMMIT`/`ROLLBACK`;
//! statements issued through the [`Database`] handle while it is open join
//! the transaction, and a second `begin` is refused.
//!
//! Lock order: transaction state, then connection.

use crate::adapters::context::{PreparedStatement, QueryableContext};
use crate::domain::QueryError;
use crate::ports::{FromRow, Queryable};
use parking_lot::Mutex;
use rusqlite::{Connection, Params};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Top-level database handle. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, QueryError> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Opened SQLite database");
        Ok(Self::from_connection(conn))
    }

    /// Private in-memory database.
    pub fn open_in_memory() -> Result<Self, QueryError> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Wrap an existing connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Start a transaction the caller commits or rolls back.
    pub fn begin(&self) -> Result<Transaction, QueryError> {
        self.begin_with(false)
    }

    /// Start a transaction only the runner that opened it may finish.
    pub(crate) fn begin_managed(&self) -> Result<Transaction, QueryError> {
        self.begin_with(true)
    }

    fn begin_with(&self, managed: bool) -> Result<Transaction, QueryError> {
        let conn = self.conn.lock();
        if !conn.is_autocommit() {
            return Err(QueryError::TransactionInProgress);
        }
        conn.execute_batch("BEGIN IMMEDIATE")?;
        debug!(managed, "Transaction started");
        drop(conn);

        Ok(Transaction {
            inner: Arc::new(TxInner {
                conn: Arc::clone(&self.conn),
                state: Mutex::new(TxState::Active),
                managed,
            }),
        })
    }

    /// Whether a transaction is currently open on the connection.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        !self.conn.lock().is_autocommit()
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}

impl Queryable for Database {
    fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize, QueryError> {
        execute_on(&self.conn.lock(), sql, params)
    }

    fn execute_batch(&self, sql: &str) -> Result<(), QueryError> {
        Ok(self.conn.lock().execute_batch(sql)?)
    }

    fn query_one<T: FromRow, P: Params>(&self, sql: &str, params: P) -> Result<T, QueryError> {
        query_one_on(&self.conn.lock(), sql, params)
    }

    fn query_many<T: FromRow, P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<T>, QueryError> {
        query_many_on(&self.conn.lock(), sql, params)
    }

    fn prepare(&self, sql: &str) -> Result<PreparedStatement, QueryError> {
        self.conn.lock().prepare_cached(sql)?;
        Ok(PreparedStatement::new(sql, QueryableContext::Database(self.clone())))
    }
}

/// Where a transaction is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// Open; statements run inside it.
    Active,
    /// Committed; refuses further use.
    Committed,
    /// Rolled back; refuses further use.
    RolledBack,
}

struct TxInner {
    conn: Arc<Mutex<Connection>>,
    state: Mutex<TxState>,
    managed: bool,
}

impl Drop for TxInner {
    fn drop(&mut self) {
        if *self.state.get_mut() == TxState::Active {
            if let Err(e) = self.conn.lock().execute_batch("ROLLBACK") {
                warn!(error = %e, "Rollback of abandoned transaction failed");
            } else {
                debug!("Abandoned transaction rolled back");
            }
        }
    }
}

/// Handle on an open transaction. Clones share the same transaction; the
/// last clone dropped while still active rolls it back.
#[derive(Clone)]
pub struct Transaction {
    inner: Arc<TxInner>,
}

impl Transaction {
    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TxState {
        *self.inner.state.lock()
    }

    /// Whether statements can still run.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == TxState::Active
    }

    /// Handle on the connection this transaction runs on.
    #[must_use]
    pub fn database(&self) -> Database {
        Database {
            conn: Arc::clone(&self.inner.conn),
        }
    }

    /// Commit. Refused for transactions owned by a runner.
    pub fn commit(&self) -> Result<(), QueryError> {
        if self.inner.managed {
            return Err(QueryError::ManagedTransaction);
        }
        self.finish_commit()
    }

    /// Roll back. Refused for transactions owned by a runner.
    pub fn rollback(&self) -> Result<(), QueryError> {
        if self.inner.managed {
            return Err(QueryError::ManagedTransaction);
        }
        self.finish_rollback()
    }

    /// Commit; a failed commit is rolled back and the transaction closed.
    pub(crate) fn finish_commit(&self) -> Result<(), QueryError> {
        let mut state = self.inner.state.lock();
        if *state != TxState::Active {
            return Err(QueryError::TransactionClosed);
        }
        let conn = self.inner.conn.lock();
        match conn.execute_batch("COMMIT") {
            Ok(()) => {
                *state = TxState::Committed;
                debug!("Transaction committed");
                Ok(())
            }
            Err(e) => {
                if !conn.is_autocommit() {
                    if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                        warn!(error = %rollback, "Rollback after failed commit failed");
                    }
                }
                *state = TxState::RolledBack;
                warn!(error = %e, "Commit failed, transaction rolled back");
                Err(e.into())
            }
        }
    }

    pub(crate) fn finish_rollback(&self) -> Result<(), QueryError> {
        let mut state = self.inner.state.lock();
        if *state != TxState::Active {
            return Err(QueryError::TransactionClosed);
        }
        let conn = self.inner.conn.lock();
        if let Err(e) = conn.execute_batch("ROLLBACK") {
            if conn.is_autocommit() {
                *state = TxState::RolledBack;
            }
            warn!(error = %e, "Rollback failed");
            return Err(e.into());
        }
        *state = TxState::RolledBack;
        debug!("Transaction rolled back");
        Ok(())
    }

    fn with_conn<R>(
        &self,
        f: impl FnOnce(&Connection) -> Result<R, QueryError>,
    ) -> Result<R, QueryError> {
        let state = self.inner.state.lock();
        if *state != TxState::Active {
            return Err(QueryError::TransactionClosed);
        }
        let conn = self.inner.conn.lock();
        f(&conn)
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("state", &self.state())
            .field("managed", &self.inner.managed)
            .finish()
    }
}

impl Queryable for Transaction {
    fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize, QueryError> {
        self.with_conn(|conn| execute_on(conn, sql, params))
    }

    fn execute_batch(&self, sql: &str) -> Result<(), QueryError> {
        self.with_conn(|conn| Ok(conn.execute_batch(sql)?))
    }

    fn query_one<T: FromRow, P: Params>(&self, sql: &str, params: P) -> Result<T, QueryError> {
        self.with_conn(|conn| query_one_on(conn, sql, params))
    }

    fn query_many<T: FromRow, P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<T>, QueryError> {
        self.with_conn(|conn| query_many_on(conn, sql, params))
    }

    fn prepare(&self, sql: &str) -> Result<PreparedStatement, QueryError> {
        self.with_conn(|conn| {
            conn.prepare_cached(sql)?;
            Ok(())
        })?;
        Ok(PreparedStatement::new(sql, QueryableContext::Transaction(self.clone())))
    }
}

fn execute_on<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<usize, QueryError> {
    let mut stmt = conn.prepare_cached(sql)?;
    Ok(stmt.execute(params)?)
}

fn query_one_on<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<T, QueryError> {
    let mut stmt = conn.prepare_cached(sql)?;
    Ok(stmt.query_row(params, T::from_row)?)
}

fn query_many_on<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<T>, QueryError> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(params, T::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<T>>>()?)
}
