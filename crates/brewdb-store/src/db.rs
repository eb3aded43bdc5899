//! Database connection management
//!
//! A [`Database`] is a cheap, cloneable handle to one SQLite connection. Every
//! record store built on the same handle shares that connection, so a whole
//! application (and each test) chooses its database in one place.

use std::cell::{Ref, RefCell, RefMut};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use rusqlite::Connection;

use crate::config::DbConfig;
use crate::errors::{connection_busy, from_rusqlite, Result};

/// Shared handle to an open, configured connection
#[derive(Clone)]
pub struct Database {
    conn: Rc<RefCell<Connection>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("handles", &Rc::strong_count(&self.conn))
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open a database file with default settings
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error if the file cannot be opened or configured.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_config(&DbConfig::for_path(path.as_ref()))
    }

    /// Open an in-memory database with default settings (for testing)
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error if SQLite cannot allocate the database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_config(&DbConfig::default())
    }

    /// Open the database a config describes
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error if the database cannot be opened or configured.
    pub fn from_config(config: &DbConfig) -> Result<Self> {
        let conn = match &config.path {
            Some(path) => Connection::open(path),
            None => Connection::open_in_memory(),
        }
        .map_err(from_rusqlite)?;
        configure(&conn, config)?;

        tracing::debug!(
            component = module_path!(),
            path = ?config.path,
            foreign_keys = config.foreign_keys,
            "Opened database"
        );
        Ok(Self::from_connection(conn))
    }

    /// Wrap a connection the caller has already opened and configured
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Rc::new(RefCell::new(conn)),
        }
    }

    /// Shared access to the connection, for ad-hoc queries
    ///
    /// # Errors
    ///
    /// Returns a `Concurrency` error while a store operation holds the connection.
    pub fn connection(&self) -> Result<Ref<'_, Connection>> {
        self.conn.try_borrow().map_err(|_| connection_busy())
    }

    /// Exclusive access to the connection, needed to open a transaction
    ///
    /// # Errors
    ///
    /// Returns a `Concurrency` error if the connection is already borrowed.
    pub fn connection_mut(&self) -> Result<RefMut<'_, Connection>> {
        self.conn.try_borrow_mut().map_err(|_| connection_busy())
    }

    /// Run a batch of SQL statements outside any store, e.g. schema DDL
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error if any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.connection()?
            .execute_batch(sql)
            .map_err(|e| crate::errors::statement_error(sql, e))
    }

    /// Whether two handles share one connection
    pub fn same_connection(&self, other: &Database) -> bool {
        Rc::ptr_eq(&self.conn, &other.conn)
    }
}

/// Apply connection settings
///
/// The journal mode is only set for file databases; in-memory databases
/// always use the MEMORY journal.
///
/// # Errors
///
/// Returns a `Persistence` error if a pragma fails.
pub fn configure(conn: &Connection, config: &DbConfig) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", config.foreign_keys)
        .map_err(from_rusqlite)?;

    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(from_rusqlite)?;

    if config.path.is_some() {
        // journal_mode returns the resulting mode as a row
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", config.journal_mode.as_str(), |row| row.get(0))
            .map_err(from_rusqlite)?;
        if !mode.eq_ignore_ascii_case(&config.journal_mode) {
            tracing::warn!(
                component = module_path!(),
                requested = %config.journal_mode,
                actual = %mode,
                "SQLite did not accept the requested journal mode"
            );
        }
    }

    Ok(())
}
