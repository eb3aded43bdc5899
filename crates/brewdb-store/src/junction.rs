//! Junction table persistence
//!
//! A many-to-many property is stored as rows of `(this key, other key)`,
//! plus a 1-based position when the relation is ordered. The rows belong to
//! the owning object; saving the property replaces them all.

use std::collections::BTreeMap;

use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;

use brewdb_core::descriptor::FieldManyToManyDefn;
use brewdb_core::errors::RecordError;
use brewdb_core::Value;

use crate::column::key_to_sql;
use crate::errors::{statement_error, Result};
use crate::sql;

/// Write the junction rows for one object's relation value
///
/// `Null` writes nothing. A single key is accepted where the relation
/// assumes at most one entry; otherwise the value must be a list. Returns the
/// number of rows written.
///
/// # Errors
///
/// Returns `TypeMismatch` for a value of the wrong shape and a `Persistence`
/// error if an insert fails.
pub fn insert_relation(
    conn: &Connection,
    relation: &FieldManyToManyDefn,
    this_key: i64,
    value: &Value,
) -> Result<usize> {
    let entries: Vec<&Value> = match value {
        Value::Null => Vec::new(),
        Value::List(items) => items.iter().collect(),
        single if relation.assume_max_one_entry => vec![single],
        other => {
            return Err(RecordError::TypeMismatch {
                property: relation.property_name.to_string(),
                expected: "list".to_string(),
                found: other.type_name().to_string(),
            }
            .into())
        }
    };
    if entries.is_empty() {
        return Ok(0);
    }

    let statement = sql::junction_insert(relation);
    let mut stmt = conn
        .prepare_cached(&statement)
        .map_err(|e| statement_error(&statement, e))?;
    for (position, other) in entries.iter().enumerate() {
        let other_key = key_to_sql(relation.property_name, other)?;
        let result = match relation.order_by_column {
            Some(_) => stmt.execute(rusqlite::params![
                this_key,
                other_key,
                position as i64 + 1
            ]),
            None => stmt.execute(rusqlite::params![this_key, other_key]),
        };
        result.map_err(|e| statement_error(&statement, e))?;
    }

    tracing::debug!(
        component = module_path!(),
        junction = relation.table_name,
        this_key,
        rows = entries.len(),
        "Wrote junction rows"
    );
    Ok(entries.len())
}

/// Delete every junction row owned by `this_key`, returning the count
///
/// # Errors
///
/// Returns a `Persistence` error if the delete fails.
pub fn delete_relation(conn: &Connection, relation: &FieldManyToManyDefn, this_key: i64) -> Result<usize> {
    let statement = sql::junction_delete(relation);
    conn.execute(&statement, [this_key])
        .map_err(|e| statement_error(&statement, e))
}

/// Replace an object's junction rows with `value`
///
/// # Errors
///
/// As [`delete_relation`] and [`insert_relation`].
pub fn replace_relation(
    conn: &Connection,
    relation: &FieldManyToManyDefn,
    this_key: i64,
    value: &Value,
) -> Result<usize> {
    delete_relation(conn, relation, this_key)?;
    insert_relation(conn, relation, this_key, value)
}

/// Read a whole junction table, grouped by owning key
///
/// Within each group the other keys keep their stored order (position for
/// ordered relations, key order otherwise).
///
/// # Errors
///
/// Returns a `Persistence` error if the query fails and `TypeMismatch` for a
/// non-integer key.
pub fn read_relations(conn: &Connection, relation: &FieldManyToManyDefn) -> Result<BTreeMap<i64, Vec<Value>>> {
    let statement = sql::junction_select(relation);
    let mut stmt = conn
        .prepare(&statement)
        .map_err(|e| statement_error(&statement, e))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, SqlValue>(1)?)))
        .map_err(|e| statement_error(&statement, e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| statement_error(&statement, e))?;

    let mut grouped: BTreeMap<i64, Vec<Value>> = BTreeMap::new();
    for (this_key, other) in rows {
        let other = match other {
            SqlValue::Integer(key) => Value::Int(key),
            SqlValue::Null => continue,
            unexpected => {
                return Err(RecordError::TypeMismatch {
                    property: relation.property_name.to_string(),
                    expected: "key".to_string(),
                    found: format!("{:?}", unexpected.data_type()),
                }
                .into())
            }
        };
        grouped.entry(this_key).or_default().push(other);
    }
    Ok(grouped)
}
