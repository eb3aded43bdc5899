//! Named parameter bundle used to hydrate entities
//!
//! A bundle maps property names to values. The record store fills one per
//! database row and hands it to `Persisted::from_bundle`, so entities are built
//! fully initialised through their constructor rather than through setters.

use std::collections::BTreeMap;

use crate::errors::{RecordError, Result};
use crate::value::{FromValue, Value};

/// Property name to value map handed to entity constructors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedParameterBundle {
    params: BTreeMap<String, Value>,
}

impl NamedParameterBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter
    ///
    /// # Errors
    ///
    /// Returns `DuplicateParameter` if `name` is already present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let name = name.into();
        if self.params.contains_key(&name) {
            return Err(RecordError::DuplicateParameter { name });
        }
        self.params.insert(name, value.into());
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert) for literal bundles
    ///
    /// # Errors
    ///
    /// Returns `DuplicateParameter` if `name` is already present.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        self.insert(name, value)?;
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Read a required parameter
    ///
    /// # Errors
    ///
    /// Returns `MissingParameter` if absent and `TypeMismatch` if the stored
    /// value cannot be converted to `T`.
    pub fn val<T: FromValue>(&self, name: &str) -> Result<T> {
        self.params
            .get(name)
            .ok_or_else(|| RecordError::MissingParameter {
                name: name.to_string(),
            })?
            .to(name)
    }

    /// Read an optional parameter, falling back to `default` when absent
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the parameter is present with an incompatible type.
    pub fn val_or<T: FromValue>(&self, name: &str, default: T) -> Result<T> {
        match self.params.get(name) {
            Some(value) => value.to(name),
            None => Ok(default),
        }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate parameters in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut bundle = NamedParameterBundle::new();
        bundle.insert("name", "Cascade").unwrap();
        let err = bundle.insert("name", "Citra").unwrap_err();
        assert_eq!(
            err,
            RecordError::DuplicateParameter {
                name: "name".to_string()
            }
        );
        assert_eq!(bundle.val::<String>("name").unwrap(), "Cascade");
    }

    #[test]
    fn test_required_and_defaulted_reads() {
        let bundle = NamedParameterBundle::new()
            .with("alpha_pct", 5.5)
            .unwrap();

        assert_eq!(bundle.val::<f64>("alpha_pct").unwrap(), 5.5);
        assert_eq!(bundle.val_or::<f64>("beta_pct", 0.0).unwrap(), 0.0);
        assert!(matches!(
            bundle.val::<f64>("beta_pct"),
            Err(RecordError::MissingParameter { .. })
        ));
        assert!(matches!(
            bundle.val_or::<String>("alpha_pct", String::new()),
            Err(RecordError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_iteration_is_name_ordered() {
        let bundle = NamedParameterBundle::new()
            .with("zeta", 1)
            .unwrap()
            .with("alpha", 2)
            .unwrap();
        let names: Vec<&str> = bundle.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(bundle.len(), 2);
    }
}
