//! Transaction scope
//!
//! Every store mutation runs inside one `TransactionScope`. The scope commits
//! only when [`TransactionScope::commit`] is called; dropping it on any other
//! path (an early `?` return, a panic) rolls back.

use rusqlite::{Connection, Params, Transaction};

use brewdb_core::errors::{ExError, ExErrorKind};

use crate::errors::{from_rusqlite, statement_error, Result};

/// A transaction that rolls back unless committed
pub struct TransactionScope<'c> {
    tx: Option<Transaction<'c>>,
    label: &'static str,
}

impl<'c> TransactionScope<'c> {
    /// Begin a transaction on `conn`, tagged with `label` for logging
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error if SQLite refuses to begin.
    pub fn begin(conn: &'c mut Connection, label: &'static str) -> Result<Self> {
        let tx = conn.transaction().map_err(from_rusqlite)?;
        tracing::trace!(component = module_path!(), label, "Transaction begun");
        Ok(Self {
            tx: Some(tx),
            label,
        })
    }

    /// The connection statements in this transaction run on
    ///
    /// # Errors
    ///
    /// Returns an `Internal` error if the scope has already finished.
    pub fn connection(&self) -> Result<&Connection> {
        self.tx.as_deref().ok_or_else(|| {
            ExError::new(ExErrorKind::Internal)
                .with_op(self.label)
                .with_message("transaction scope already finished")
        })
    }

    /// Execute one statement, returning the number of rows changed
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error if the statement fails; the SQL is logged.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        self.connection()?
            .execute(sql, params)
            .map_err(|e| statement_error(sql, e))
    }

    /// Commit the transaction
    ///
    /// # Errors
    ///
    /// Returns a `Persistence` error if the commit fails, in which case the
    /// transaction has been rolled back.
    pub fn commit(mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => {
                tx.commit().map_err(from_rusqlite)?;
                tracing::trace!(component = module_path!(), label = self.label, "Transaction committed");
                Ok(())
            }
            None => Err(ExError::new(ExErrorKind::Internal)
                .with_op(self.label)
                .with_message("transaction scope already finished")),
        }
    }
}

impl Drop for TransactionScope<'_> {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            match tx.rollback() {
                Ok(()) => tracing::debug!(
                    component = module_path!(),
                    label = self.label,
                    "Transaction rolled back"
                ),
                Err(err) => tracing::error!(
                    component = module_path!(),
                    label = self.label,
                    error = %err,
                    "Transaction rollback failed"
                ),
            }
        }
    }
}
