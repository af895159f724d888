//! Database-backed provider.
//!
//! Responsibilities:
//! - Read and upsert JSON documents in the `config(namespace, name, value)`
//!   table for one namespace.
//! - Define the `Connection` capability the provider and the database loader
//!   need, with a SQLite implementation.
//!
//! Does NOT handle:
//! - Schema migrations beyond `CREATE TABLE IF NOT EXISTS`.
//! - Connection pooling; callers share one `Arc<dyn Connection>`.
//!
//! Invariants:
//! - Every statement is scoped to the provider's namespace.
//! - A stored empty value decodes to the target's default.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use thiserror::Error;

use super::{Persist, Provider};
use crate::constants::DATABASE_SCHEMA;
use crate::error::{DecodeError, PersistError};
use crate::schema::AnyValue;

const SELECT_EXISTS: &str = "SELECT 1 FROM config WHERE namespace = $1 AND name = $2";
const SELECT_VALUE: &str = "SELECT value FROM config WHERE namespace = $1 AND name = $2";
const UPSERT_VALUE: &str = "INSERT INTO config (namespace, name, value) VALUES ($1, $2, $3)
    ON CONFLICT (namespace, name) DO UPDATE SET value = excluded.value";
const INSERT_NAMESPACE: &str = "INSERT INTO namespace (namespace) VALUES ($1)
    ON CONFLICT (namespace) DO NOTHING";

/// Driver-level failures.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("unexpected {found} value in text column")]
    ColumnType { found: &'static str },
}

/// Minimal SQL capability: run a statement, or read one text column of one row.
pub trait Connection: Send + Sync + fmt::Debug {
    /// First column of the first row, or `None` when no row matches.
    fn query_value(&self, sql: &str, params: &[&str]) -> Result<Option<String>, DatabaseError>;

    /// Run a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &[&str]) -> Result<usize, DatabaseError>;
}

/// SQLite connection behind a mutex.
pub struct SqliteConnection {
    inner: Mutex<rusqlite::Connection>,
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection").finish_non_exhaustive()
    }
}

impl SqliteConnection {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(rusqlite::Connection::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(rusqlite::Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self {
            inner: Mutex::new(conn),
        }
    }

    /// Create the `namespace` and `config` tables if they do not exist.
    pub fn create_schema(&self) -> Result<(), DatabaseError> {
        self.inner.lock().execute_batch(DATABASE_SCHEMA)?;
        Ok(())
    }

    /// Record `namespace` in the namespace table.
    pub fn register_namespace(&self, namespace: &str) -> Result<(), DatabaseError> {
        self.execute(INSERT_NAMESPACE, &[namespace])?;
        Ok(())
    }
}

impl Connection for SqliteConnection {
    fn query_value(&self, sql: &str, params: &[&str]) -> Result<Option<String>, DatabaseError> {
        let conn = self.inner.lock();
        let mut stmt = conn.prepare_cached(sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let value = match row.get_ref(0)? {
            ValueRef::Null => String::new(),
            ValueRef::Integer(i) => i.to_string(),
            ValueRef::Real(f) => f.to_string(),
            ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            ValueRef::Blob(_) => {
                return Err(DatabaseError::ColumnType { found: "blob" });
            }
        };
        Ok(Some(value))
    }

    fn execute(&self, sql: &str, params: &[&str]) -> Result<usize, DatabaseError> {
        let conn = self.inner.lock();
        let mut stmt = conn.prepare_cached(sql)?;
        Ok(stmt.execute(rusqlite::params_from_iter(params.iter()))?)
    }
}

/// Reads and writes the `config` rows of one namespace.
#[derive(Debug)]
pub struct DatabaseProvider {
    conn: Arc<dyn Connection>,
    namespace: String,
    read_only: bool,
}

impl DatabaseProvider {
    pub fn new(conn: Arc<dyn Connection>, namespace: impl Into<String>, read_only: bool) -> Self {
        Self {
            conn,
            namespace: namespace.into(),
            read_only,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl Provider for DatabaseProvider {
    fn has(&self, key: &str) -> bool {
        match self.conn.query_value(SELECT_EXISTS, &[self.namespace.as_str(), key]) {
            Ok(found) => found.is_some(),
            Err(e) => {
                tracing::warn!(
                    namespace = %self.namespace,
                    key = %key,
                    error = %e,
                    "failed to probe configuration row"
                );
                false
            }
        }
    }

    fn decode(&self, key: &str, target: &mut dyn AnyValue) -> Result<(), DecodeError> {
        let stored = self
            .conn
            .query_value(SELECT_VALUE, &[self.namespace.as_str(), key])?
            .ok_or_else(|| DecodeError::NotFound {
                key: key.to_string(),
            })?;

        if stored.is_empty() {
            return Ok(());
        }
        target.load_document(serde_json::from_str(&stored)?)?;
        Ok(())
    }

    fn writer(&self) -> Option<&dyn Persist> {
        Some(self)
    }
}

impl Persist for DatabaseProvider {
    fn can_persist(&self, _key: &str) -> bool {
        !self.read_only
    }

    fn persist(&self, key: &str, value: &dyn AnyValue) -> Result<(), PersistError> {
        let document = serde_json::to_string(&value.to_document()?)?;
        self.conn
            .execute(UPSERT_VALUE, &[self.namespace.as_str(), key, document.as_str()])?;
        tracing::debug!(namespace = %self.namespace, key = %key, "persisted configuration row");
        Ok(())
    }
}
