//! SQLite-backed key/value store.
//!
//! Values live in table `kv_store`. Compare-and-swap runs inside a runner
//! transaction so the read and the conditional write are atomic. Calls are
//! serialized through a gate so no statement joins another call's
//! transaction on the shared connection.

use crate::ports::{KeyValueStore, StoreError};
use async_trait::async_trait;
use parking_lot::Mutex;
use sp_01_queryable::{run_in_transaction_with_db, Database, QueryError, Queryable, RunError};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL
)";

/// Key/value store over a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    db: Database,
    gate: Arc<Mutex<()>>,
}

impl SqliteKeyValueStore {
    /// Store over an existing database handle; creates the table if needed.
    pub fn new(db: Database) -> Result<Self, StoreError> {
        db.execute_batch(SCHEMA).map_err(backend)?;
        Ok(Self {
            db,
            gate: Arc::new(Mutex::new(())),
        })
    }

    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::open(path).map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::new(db)
    }

    /// Private in-memory store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let db = Database::open_in_memory().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::new(db)
    }

    fn read(q: &impl Queryable, key: &str) -> Result<Option<Vec<u8>>, QueryError> {
        let mut rows: Vec<Vec<u8>> =
            q.query_many("SELECT value FROM kv_store WHERE key = ?1", [key])?;
        Ok(rows.pop())
    }
}

fn backend(e: QueryError) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let _gate = self.gate.lock();
        self.db
            .query_one::<i64, _>("SELECT 1", [])
            .map(|_| ())
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let _gate = self.gate.lock();
        Self::read(&self.db, key).map_err(backend)
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        let _gate = self.gate.lock();
        self.db
            .execute(
                "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                rusqlite::params![key, value],
            )
            .map(|_| ())
            .map_err(backend)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let _gate = self.gate.lock();
        self.db
            .execute("DELETE FROM kv_store WHERE key = ?1", [key])
            .map(|n| n > 0)
            .map_err(backend)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<Vec<u8>>,
    ) -> Result<bool, StoreError> {
        let gate = self.gate.lock();
        let swapped = run_in_transaction_with_db(&self.db, |tx| {
            if Self::read(tx, key)?.as_deref() != expected {
                return Ok::<_, QueryError>(false);
            }
            match &new {
                Some(value) => tx.execute(
                    "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    rusqlite::params![key, value],
                )?,
                None => tx.execute("DELETE FROM kv_store WHERE key = ?1", [key])?,
            };
            Ok(true)
        });
        drop(gate);

        match swapped {
            Ok(swapped) => {
                debug!(key, swapped, "Compare-and-swap");
                Ok(swapped)
            }
            Err(RunError::Begin(e)) | Err(RunError::Work(e)) | Err(RunError::Commit(e)) => {
                Err(backend(e))
            }
        }
    }
}
