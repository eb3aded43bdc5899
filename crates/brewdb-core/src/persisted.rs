//! Capability required of every persisted entity type

use std::cell::RefCell;
use std::rc::Rc;

use crate::bundle::NamedParameterBundle;
use crate::errors::Result;
use crate::value::Value;

/// Shared handle to a cached entity
///
/// Every holder sees in-place mutation. Mutating through a handle does not
/// write anything to the database; callers flush with `update` or
/// `update_property` on the owning store.
pub type Handle<T> = Rc<RefCell<T>>;

/// Wrap an entity in a fresh handle
pub fn handle<T>(object: T) -> Handle<T> {
    Rc::new(RefCell::new(object))
}

/// Named-property access used by the record store
///
/// Property names are the `property_name`s of the table's field descriptors.
pub trait Persisted: Sized {
    /// Construct a fully initialised object from one database row
    ///
    /// Called during bulk load instead of setters, so setter side effects
    /// never run while the cache is being built.
    ///
    /// # Errors
    ///
    /// Returns an error if a required parameter is missing or has the wrong type.
    fn from_bundle(bundle: &NamedParameterBundle) -> Result<Self>;

    /// Read a property, or `None` if the entity has no such property
    fn get_field(&self, property: &str) -> Option<Value>;

    /// Write a property
    ///
    /// # Errors
    ///
    /// Returns `UnknownProperty` or `TypeMismatch` when the write cannot be applied.
    fn set_field(&mut self, property: &str, value: Value) -> Result<()>;
}
