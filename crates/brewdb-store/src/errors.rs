//! Error handling for brewdb-store
//!
//! Wraps brewdb-core ExError with driver-specific helpers

use brewdb_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a database error from rusqlite::Error
///
/// The operation is left unset; the store operation that hit the error
/// attaches its own name.
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence).with_message(err.to_string())
}

/// Create a database error for a failed statement, logging the statement text
///
/// Driver errors carry the driver's message but not the SQL that produced
/// them, so the statement is logged here before the error propagates.
pub fn statement_error(sql: &str, err: rusqlite::Error) -> ExError {
    tracing::error!(
        component = module_path!(),
        sql,
        error = %err,
        "Error executing database statement"
    );
    from_rusqlite(err)
}

/// Create a configuration error
pub fn config_error(reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("config")
        .with_message(reason)
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create an error for a connection that is already inside a transaction
pub fn connection_busy() -> ExError {
    ExError::new(ExErrorKind::Concurrency)
        .with_op("connection")
        .with_message("connection is already in use by another store operation")
}
