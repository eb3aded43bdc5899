//! Field descriptor model
//!
//! Static schema metadata describing how one entity type maps onto a main
//! table plus any number of junction tables. Descriptors are supplied once
//! when a store is built and never change afterwards.
//!
//! By convention the first simple field is the primary key, which must be an
//! integer column whose value the database assigns on insert.

use std::collections::HashSet;

use crate::errors::{RecordError, Result};

/// Storage type of a simple field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Int,
    UInt,
    Double,
    String,
    Date,
    /// Native integer stored as its mapped database string
    Enum,
}

impl FieldType {
    pub fn is_integer(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::UInt)
    }
}

/// One enum value and the string it is stored as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumAndItsDbString {
    pub native: i32,
    pub string: &'static str,
}

impl EnumAndItsDbString {
    pub const fn new(native: i32, string: &'static str) -> Self {
        Self { native, string }
    }
}

/// One scalar column mapped to one property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSimpleDefn {
    pub field_type: FieldType,
    pub column_name: &'static str,
    pub property_name: &'static str,
    pub enum_mapping: Option<&'static [EnumAndItsDbString]>,
}

impl FieldSimpleDefn {
    pub const fn new(
        field_type: FieldType,
        column_name: &'static str,
        property_name: &'static str,
    ) -> Self {
        Self {
            field_type,
            column_name,
            property_name,
            enum_mapping: None,
        }
    }

    /// An enum field with its native/string mapping
    pub const fn enumeration(
        column_name: &'static str,
        property_name: &'static str,
        mapping: &'static [EnumAndItsDbString],
    ) -> Self {
        Self {
            field_type: FieldType::Enum,
            column_name,
            property_name,
            enum_mapping: Some(mapping),
        }
    }
}

/// A relation stored in a junction table
///
/// Junction rows carry no identity beyond `(this key, other key[, order])` and
/// are owned entirely by the relation: they are rewritten wholesale whenever
/// the property is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldManyToManyDefn {
    pub table_name: &'static str,
    pub property_name: &'static str,
    pub this_key_column: &'static str,
    pub other_key_column: &'static str,
    /// Integer column holding the 1-based position of each entry, if ordered
    pub order_by_column: Option<&'static str>,
    /// The property holds a single key rather than a list
    pub assume_max_one_entry: bool,
}

impl FieldManyToManyDefn {
    pub const fn new(
        table_name: &'static str,
        property_name: &'static str,
        this_key_column: &'static str,
        other_key_column: &'static str,
    ) -> Self {
        Self {
            table_name,
            property_name,
            this_key_column,
            other_key_column,
            order_by_column: None,
            assume_max_one_entry: false,
        }
    }

    pub const fn ordered_by(mut self, column: &'static str) -> Self {
        self.order_by_column = Some(column);
        self
    }

    pub const fn max_one_entry(mut self) -> Self {
        self.assume_max_one_entry = true;
        self
    }
}

/// Complete mapping for one entity type
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefn {
    table_name: &'static str,
    simple_fields: Vec<FieldSimpleDefn>,
    many_to_many_fields: Vec<FieldManyToManyDefn>,
}

impl TableDefn {
    /// Build and validate a table definition
    ///
    /// # Errors
    ///
    /// Returns `InvalidDefinition` if the primary key is missing or not an
    /// integer, an enum field lacks a bijective mapping, or a property or
    /// column name is repeated.
    pub fn new(
        table_name: &'static str,
        simple_fields: Vec<FieldSimpleDefn>,
        many_to_many_fields: Vec<FieldManyToManyDefn>,
    ) -> Result<Self> {
        let defn = Self {
            table_name,
            simple_fields,
            many_to_many_fields,
        };
        defn.validate()?;
        Ok(defn)
    }

    fn invalid(&self, reason: impl Into<String>) -> RecordError {
        RecordError::InvalidDefinition {
            table: self.table_name.to_string(),
            reason: reason.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(self.invalid("table name is empty"));
        }

        let primary_key = self
            .simple_fields
            .first()
            .ok_or_else(|| self.invalid("no simple fields; the first field must be the primary key"))?;
        if !primary_key.field_type.is_integer() {
            return Err(self.invalid(format!(
                "primary key {} must be an integer field, not {:?}",
                primary_key.column_name, primary_key.field_type
            )));
        }

        let mut properties = HashSet::new();
        let mut columns = HashSet::new();
        for field in &self.simple_fields {
            if !properties.insert(field.property_name) {
                return Err(self.invalid(format!("property {} declared twice", field.property_name)));
            }
            if !columns.insert(field.column_name) {
                return Err(self.invalid(format!("column {} declared twice", field.column_name)));
            }
            match (field.field_type, field.enum_mapping) {
                (FieldType::Enum, Some(mapping)) => self.validate_mapping(field, mapping)?,
                (FieldType::Enum, None) => {
                    return Err(self.invalid(format!("enum column {} has no mapping", field.column_name)))
                }
                (_, Some(_)) => {
                    return Err(self.invalid(format!(
                        "non-enum column {} carries an enum mapping",
                        field.column_name
                    )))
                }
                (_, None) => {}
            }
        }

        for relation in &self.many_to_many_fields {
            if !properties.insert(relation.property_name) {
                return Err(self.invalid(format!(
                    "property {} declared twice",
                    relation.property_name
                )));
            }
            if relation.table_name.is_empty()
                || relation.this_key_column.is_empty()
                || relation.other_key_column.is_empty()
                || relation.order_by_column == Some("")
            {
                return Err(self.invalid(format!(
                    "junction for {} has an empty table or column name",
                    relation.property_name
                )));
            }
        }

        Ok(())
    }

    fn validate_mapping(
        &self,
        field: &FieldSimpleDefn,
        mapping: &[EnumAndItsDbString],
    ) -> Result<()> {
        if mapping.is_empty() {
            return Err(self.invalid(format!("enum column {} has an empty mapping", field.column_name)));
        }
        let mut natives = HashSet::new();
        let mut strings = HashSet::new();
        for entry in mapping {
            if !natives.insert(entry.native) || !strings.insert(entry.string) {
                return Err(self.invalid(format!(
                    "enum mapping for column {} is not bijective at ({}, {})",
                    field.column_name, entry.native, entry.string
                )));
            }
        }
        Ok(())
    }

    pub fn table_name(&self) -> &'static str {
        self.table_name
    }

    pub fn simple_fields(&self) -> &[FieldSimpleDefn] {
        &self.simple_fields
    }

    pub fn many_to_many_fields(&self) -> &[FieldManyToManyDefn] {
        &self.many_to_many_fields
    }

    /// The primary key field (always the first simple field)
    pub fn primary_key(&self) -> &FieldSimpleDefn {
        // Non-empty is checked in `new`
        &self.simple_fields[0]
    }

    /// Every simple field except the primary key, in declaration order
    pub fn non_key_fields(&self) -> &[FieldSimpleDefn] {
        &self.simple_fields[1..]
    }

    pub fn simple_field(&self, property: &str) -> Option<&FieldSimpleDefn> {
        self.simple_fields
            .iter()
            .find(|f| f.property_name == property)
    }

    pub fn many_to_many_field(&self, property: &str) -> Option<&FieldManyToManyDefn> {
        self.many_to_many_fields
            .iter()
            .find(|f| f.property_name == property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static HOP_USE: [EnumAndItsDbString; 2] = [
        EnumAndItsDbString::new(0, "Boil"),
        EnumAndItsDbString::new(1, "Dry Hop"),
    ];

    static BROKEN_USE: [EnumAndItsDbString; 2] = [
        EnumAndItsDbString::new(0, "Boil"),
        EnumAndItsDbString::new(1, "Boil"),
    ];

    fn key() -> FieldSimpleDefn {
        FieldSimpleDefn::new(FieldType::Int, "id", "key")
    }

    #[test]
    fn test_valid_definition() {
        let defn = TableDefn::new(
            "hop",
            vec![
                key(),
                FieldSimpleDefn::new(FieldType::String, "name", "name"),
                FieldSimpleDefn::enumeration("hop_use", "use", &HOP_USE),
            ],
            vec![FieldManyToManyDefn::new("hop_substitute", "substitutes", "hop_id", "substitute_id")],
        )
        .unwrap();

        assert_eq!(defn.primary_key().column_name, "id");
        assert_eq!(defn.non_key_fields().len(), 2);
        assert!(defn.simple_field("use").is_some());
        assert!(defn.many_to_many_field("substitutes").is_some());
        assert!(defn.simple_field("substitutes").is_none());
    }

    #[test]
    fn test_primary_key_must_be_integer() {
        let err = TableDefn::new(
            "hop",
            vec![FieldSimpleDefn::new(FieldType::String, "name", "name")],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, RecordError::InvalidDefinition { .. }));

        assert!(TableDefn::new("hop", vec![], vec![]).is_err());
    }

    #[test]
    fn test_enum_mapping_must_be_bijective() {
        let err = TableDefn::new(
            "hop",
            vec![key(), FieldSimpleDefn::enumeration("hop_use", "use", &BROKEN_USE)],
            vec![],
        )
        .unwrap_err();
        assert!(err.to_string().contains("not bijective"));
    }

    #[test]
    fn test_enum_field_needs_mapping() {
        let bare_enum = FieldSimpleDefn::new(FieldType::Enum, "hop_use", "use");
        assert!(TableDefn::new("hop", vec![key(), bare_enum], vec![]).is_err());
    }

    #[test]
    fn test_duplicate_property_across_kinds() {
        let err = TableDefn::new(
            "recipe",
            vec![key(), FieldSimpleDefn::new(FieldType::Int, "style_id", "style")],
            vec![FieldManyToManyDefn::new("recipe_style", "style", "recipe_id", "style_id").max_one_entry()],
        )
        .unwrap_err();
        assert!(err.to_string().contains("declared twice"));
    }
}
