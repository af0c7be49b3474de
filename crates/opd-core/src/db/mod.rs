//! Database layer for the OPD store.
//!
//! [`Database`] owns the SQLite connection. All reads and writes go through a
//! borrowed [`Store`], which works the same over the bare connection or over an
//! open transaction handed out by [`Database::unit_of_work`].

mod schema;
mod principals;
mod addresses;
mod doctors;
mod opds;
mod inventory;
mod appointments;
mod patients;

pub use opds::CounterState;
pub use schema::*;

use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::open_with_timeout(path, Duration::from_millis(Config::default().busy_timeout_ms))
    }

    /// Open the database named by the configuration.
    pub fn open_with_config(config: &Config) -> DbResult<Self> {
        Self::open_with_timeout(
            &config.database_path,
            Duration::from_millis(config.busy_timeout_ms),
        )
    }

    fn open_with_timeout<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Non-transactional store over the bare connection.
    pub fn store(&self) -> Store<'_> {
        Store::new(&self.conn)
    }

    /// Run `work` inside one IMMEDIATE transaction.
    ///
    /// Commits when `work` returns `Ok`. Any error, or a panic unwinding
    /// through here, drops the transaction and rolls every write back.
    pub fn unit_of_work<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Store<'_>) -> Result<T, E>,
        E: From<DbError>,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DbError::from)?;
        let value = work(&Store::new(&tx))?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }
}

/// Typed repository over a connection or an open transaction.
pub struct Store<'c> {
    conn: &'c Connection,
}

impl<'c> Store<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Raw connection behind this store.
    pub fn conn(&self) -> &Connection {
        self.conn
    }
}

/// Map a unique-constraint failure to [`DbError::Constraint`] and pass
/// everything else through.
pub(crate) fn constraint_or_sqlite(err: rusqlite::Error, what: &str) -> DbError {
    match err.sqlite_error_code() {
        Some(rusqlite::ErrorCode::ConstraintViolation) => {
            DbError::Constraint(format!("{}: {}", what, err))
        }
        _ => DbError::Sqlite(err),
    }
}
