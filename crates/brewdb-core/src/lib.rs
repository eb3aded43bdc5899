//! brewdb core - storage-agnostic record kernel
//!
//! Everything a record store needs that does not touch a database driver:
//! - `Value` and `NamedParameterBundle` for dynamically typed property access
//! - the `Persisted` capability every stored entity implements
//! - field descriptors and the enum codec
//! - store observers
//! - the error and logging facilities shared by all brewdb crates

pub mod bundle;
pub mod descriptor;
pub mod enum_codec;
pub mod errors;
pub mod logging_facility;
pub mod observer;
pub mod persisted;
pub mod value;

pub use bundle::NamedParameterBundle;
pub use descriptor::{EnumAndItsDbString, FieldManyToManyDefn, FieldSimpleDefn, FieldType, TableDefn};
pub use errors::{ExError, ExErrorKind, RecordError, Result};
pub use observer::{EventLog, NoopObserver, StoreEvent, StoreObserver};
pub use persisted::{handle, Handle, Persisted};
pub use value::{FromValue, Value};

/// Text format used for `Date` values in the database
pub const DATE_FORMAT: &str = "%Y-%m-%d";
