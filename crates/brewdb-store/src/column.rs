//! Conversion between property values and SQLite column values
//!
//! The field type decides the storage class: booleans are stored as 0/1,
//! dates as `YYYY-MM-DD` text and enums as their mapped database string.

use chrono::NaiveDate;
use rusqlite::types::{Value as SqlValue, ValueRef};

use brewdb_core::descriptor::{FieldSimpleDefn, FieldType};
use brewdb_core::enum_codec::{enum_to_string, string_to_enum};
use brewdb_core::errors::RecordError;
use brewdb_core::{Value, DATE_FORMAT};

use crate::errors::Result;

fn mismatch(property: &str, expected: &str, found: &str) -> RecordError {
    RecordError::TypeMismatch {
        property: property.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

fn sql_type_name(value: &ValueRef<'_>) -> &'static str {
    match value {
        ValueRef::Null => "NULL",
        ValueRef::Integer(_) => "INTEGER",
        ValueRef::Real(_) => "REAL",
        ValueRef::Text(_) => "TEXT",
        ValueRef::Blob(_) => "BLOB",
    }
}

/// Encode a property value for binding to `field`'s column
///
/// # Errors
///
/// Returns `TypeMismatch` if the value does not fit the field type and
/// `UnmappedEnum` for an enum value with no database string.
pub fn to_sql(field: &FieldSimpleDefn, value: &Value) -> Result<SqlValue> {
    let property = field.property_name;
    let encoded = match (field.field_type, value) {
        (_, Value::Null) => SqlValue::Null,
        (FieldType::Bool, Value::Bool(b)) => SqlValue::Integer(i64::from(*b)),
        (FieldType::Int, Value::Int(i)) => SqlValue::Integer(*i),
        (FieldType::Int, Value::UInt(u)) => SqlValue::Integer(
            i64::try_from(*u).map_err(|_| mismatch(property, "int", "uint"))?,
        ),
        (FieldType::UInt, Value::UInt(u)) => SqlValue::Integer(
            i64::try_from(*u).map_err(|_| mismatch(property, "uint within i64 range", "uint"))?,
        ),
        (FieldType::UInt, Value::Int(i)) if *i >= 0 => SqlValue::Integer(*i),
        (FieldType::Double, Value::Double(d)) => SqlValue::Real(*d),
        (FieldType::Double, Value::Int(i)) => SqlValue::Real(*i as f64),
        (FieldType::String, Value::String(s)) => SqlValue::Text(s.clone()),
        (FieldType::Date, Value::Date(d)) => SqlValue::Text(d.format(DATE_FORMAT).to_string()),
        (FieldType::Enum, Value::Enum(native)) => {
            SqlValue::Text(enum_to_string(field, *native)?.to_string())
        }
        (FieldType::Enum, Value::Int(i)) => {
            let native = i32::try_from(*i).map_err(|_| mismatch(property, "enum", "int"))?;
            SqlValue::Text(enum_to_string(field, native)?.to_string())
        }
        (field_type, other) => {
            return Err(mismatch(property, &format!("{:?}", field_type), other.type_name()).into())
        }
    };
    Ok(encoded)
}

/// Decode `field`'s column from a result row
///
/// # Errors
///
/// Returns `TypeMismatch` if the stored value cannot represent the field
/// type. An enum string with no mapping decodes to the fallback native.
pub fn from_sql(field: &FieldSimpleDefn, raw: ValueRef<'_>) -> Result<Value> {
    let property = field.property_name;
    let decoded = match (field.field_type, raw) {
        (_, ValueRef::Null) => Value::Null,
        (FieldType::Bool, ValueRef::Integer(i)) => Value::Bool(i != 0),
        (FieldType::Int, ValueRef::Integer(i)) => Value::Int(i),
        (FieldType::UInt, ValueRef::Integer(i)) if i >= 0 => Value::UInt(i as u64),
        (FieldType::Double, ValueRef::Real(f)) => Value::Double(f),
        (FieldType::Double, ValueRef::Integer(i)) => Value::Double(i as f64),
        (FieldType::String, ValueRef::Text(bytes)) => Value::String(text(property, bytes)?.to_string()),
        (FieldType::Date, ValueRef::Text(bytes)) => {
            let stored = text(property, bytes)?;
            let date = NaiveDate::parse_from_str(stored, DATE_FORMAT)
                .map_err(|_| mismatch(property, "date", stored))?;
            Value::Date(date)
        }
        (FieldType::Enum, ValueRef::Text(bytes)) => {
            Value::Enum(string_to_enum(field, text(property, bytes)?)?)
        }
        (field_type, other) => {
            return Err(mismatch(property, &format!("{:?}", field_type), sql_type_name(&other)).into())
        }
    };
    Ok(decoded)
}

fn text<'a>(property: &str, bytes: &'a [u8]) -> std::result::Result<&'a str, RecordError> {
    std::str::from_utf8(bytes).map_err(|_| mismatch(property, "utf-8 text", "bytes"))
}

/// Encode a related primary key for a junction row
///
/// # Errors
///
/// Returns `TypeMismatch` if the value is not an integer.
pub fn key_to_sql(property: &str, value: &Value) -> Result<SqlValue> {
    match value {
        Value::Int(_) | Value::UInt(_) => value
            .as_i64()
            .map(SqlValue::Integer)
            .ok_or_else(|| mismatch(property, "key", value.type_name()).into()),
        other => Err(mismatch(property, "key", other.type_name()).into()),
    }
}
