//! brewdb store - SQLite persistence for descriptor-mapped entities
//!
//! Provides:
//! - Connection handling and TOML configuration
//! - Transaction scopes that roll back unless committed
//! - SQL statement builders and junction-table helpers
//! - `RecordStore<T>`, the per-entity cache and CRUD engine

#![allow(clippy::result_large_err)]

pub mod column;
pub mod config;
pub mod db;
pub mod errors;
pub mod junction;
pub mod record_store;
pub mod sql;
pub mod transaction;

// Re-export key types
pub use config::DbConfig;
pub use db::Database;
pub use errors::Result;
pub use record_store::RecordStore;
pub use transaction::TransactionScope;
