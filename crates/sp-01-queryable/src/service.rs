//! # Transaction Runners
//!
//! Begin/commit/rollback envelopes around a unit of work. Transactions
//! opened here are managed: the work can run statements on them but cannot
//! commit or roll them back itself.

use crate::adapters::{Database, QueryableContext, Transaction};
use crate::domain::QueryError;
use crate::ports::RebindQueryable;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure of a runner, by phase.
#[derive(Debug, Error)]
pub enum RunError<E> {
    /// The transaction could not be started; the work did not run.
    #[error("error when beginning transaction: {0}")]
    Begin(#[source] QueryError),

    /// The work failed; its error is returned unchanged.
    #[error("{0}")]
    Work(E),

    /// The work succeeded but the commit failed.
    #[error("error when committing transaction: {0}")]
    Commit(#[source] QueryError),
}

impl<E> RunError<E> {
    /// The work's own error, if that is what failed.
    pub fn work(self) -> Option<E> {
        match self {
            Self::Work(e) => Some(e),
            _ => None,
        }
    }

    /// Whether the failure happened at commit.
    #[must_use]
    pub fn is_commit(&self) -> bool {
        matches!(self, Self::Commit(_))
    }
}

/// Run `work` in a transaction, with `holder` rebound to it meanwhile.
///
/// `Ok` commits, `Err` rolls back. On every exit path `holder` is rebound to
/// `db`.
pub fn run_in_transaction<H, T, E, F>(db: &Database, holder: &mut H, work: F) -> Result<T, RunError<E>>
where
    H: RebindQueryable,
    F: FnOnce(&mut H) -> Result<T, E>,
{
    let tx = db.begin_managed().map_err(RunError::Begin)?;
    holder.update_queryable(QueryableContext::Transaction(tx.clone()));

    let outcome = work(holder);
    let result = finish(&tx, outcome);

    holder.update_queryable(QueryableContext::Database(db.clone()));
    result
}

/// Run `work` in a transaction it receives directly.
pub fn run_in_transaction_with_db<T, E, F>(db: &Database, work: F) -> Result<T, RunError<E>>
where
    F: FnOnce(&Transaction) -> Result<T, E>,
{
    let tx = db.begin_managed().map_err(RunError::Begin)?;
    let outcome = work(&tx);
    finish(&tx, outcome)
}

/// Run `work` in a transaction that is always rolled back.
///
/// Nothing the work writes survives the call. The work's own result is
/// returned.
pub fn run_always_rollback<T, E, F>(db: &Database, work: F) -> Result<T, RunError<E>>
where
    F: FnOnce(&Transaction) -> Result<T, E>,
{
    let tx = db.begin_managed().map_err(RunError::Begin)?;
    let outcome = work(&tx);
    if let Err(e) = tx.finish_rollback() {
        warn!(error = %e, "Rollback failed");
    }
    outcome.map_err(RunError::Work)
}

fn finish<T, E>(tx: &Transaction, outcome: Result<T, E>) -> Result<T, RunError<E>> {
    match outcome {
        Ok(value) => {
            tx.finish_commit().map_err(RunError::Commit)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.finish_rollback() {
                warn!(error = %rollback, "Rollback after failed work also failed");
            } else {
                debug!("Work failed, transaction rolled back");
            }
            Err(RunError::Work(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Queryable;

    #[derive(Debug, PartialEq)]
    struct Boom;

    fn db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.execute_batch("CREATE TABLE t (v INTEGER NOT NULL)").unwrap();
        db
    }

    fn rows(db: &Database) -> i64 {
        db.query_one("SELECT COUNT(*) FROM t", []).unwrap()
    }

    #[test]
    fn test_commit_and_rebind() {
        let db = db();
        let mut holder = QueryableContext::from(db.clone());

        let out = run_in_transaction(&db, &mut holder, |q| {
            assert!(q.is_transaction());
            q.execute("INSERT INTO t VALUES (1)", [])?;
            Ok::<_, QueryError>(7)
        })
        .unwrap();

        assert_eq!(out, 7);
        assert!(!holder.is_transaction());
        assert_eq!(rows(&db), 1);
    }

    #[test]
    fn test_work_error_rolls_back_unchanged() {
        let db = db();
        let mut holder = QueryableContext::from(db.clone());

        let err = run_in_transaction(&db, &mut holder, |q| {
            q.execute("INSERT INTO t VALUES (1)", []).unwrap();
            Err::<(), _>(Boom)
        })
        .unwrap_err();

        assert_eq!(err.work(), Some(Boom));
        assert!(!holder.is_transaction());
        assert_eq!(rows(&db), 0);
    }

    #[test]
    fn test_work_cannot_commit_managed_transaction() {
        let db = db();
        let err = run_always_rollback(&db, |tx| {
            tx.execute("INSERT INTO t VALUES (1)", [])?;
            tx.commit()
        })
        .unwrap_err();

        assert!(matches!(err, RunError::Work(QueryError::ManagedTransaction)));
        assert_eq!(rows(&db), 0);
    }

    #[test]
    fn test_always_rollback_discards_success() {
        let db = db();
        let out = run_always_rollback(&db, |tx| {
            tx.execute("INSERT INTO t VALUES (1)", [])?;
            tx.query_one::<i64, _>("SELECT COUNT(*) FROM t", [])
        })
        .unwrap();

        assert_eq!(out, 1);
        assert_eq!(rows(&db), 0);
    }

    #[test]
    fn test_begin_failure_skips_work() {
        let db = db();
        let _open = db.begin().unwrap();
        let mut ran = false;

        let err = run_in_transaction_with_db(&db, |_| {
            ran = true;
            Ok::<_, QueryError>(())
        })
        .unwrap_err();

        assert!(matches!(err, RunError::Begin(QueryError::TransactionInProgress)));
        assert!(!ran);
    }

    #[test]
    fn test_run_error_display() {
        let err: RunError<QueryError> = RunError::Commit(QueryError::TransactionClosed);
        assert_eq!(
            err.to_string(),
            "error when committing transaction: Transaction already finished"
        );
        assert!(err.is_commit());
    }
}
