//! SQL statement builders
//!
//! Statements are derived from descriptors and use positional `?N`
//! parameters. Column order always follows the descriptor order, which is
//! also the order callers bind values in. Every table and column name is
//! quoted, so descriptors may use names such as `order` or `group`.

use brewdb_core::descriptor::{FieldManyToManyDefn, TableDefn};

/// Quote an SQL identifier, doubling any embedded `"`
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn column_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `SELECT` of every simple column, primary key first
pub fn select_all(defn: &TableDefn) -> String {
    format!(
        "SELECT {} FROM {}",
        column_list(defn.simple_fields().iter().map(|f| f.column_name)),
        quote_ident(defn.table_name())
    )
}

/// `SELECT 1` for the row with a given key; binds the key
pub fn exists_by_key(defn: &TableDefn) -> String {
    format!(
        "SELECT 1 FROM {} WHERE {} = ?1",
        quote_ident(defn.table_name()),
        quote_ident(defn.primary_key().column_name)
    )
}

/// `INSERT` of every non-key column; binds non-key values in order
pub fn insert(defn: &TableDefn) -> String {
    let table = quote_ident(defn.table_name());
    let fields = defn.non_key_fields();
    if fields.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", table);
    }
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        column_list(fields.iter().map(|f| f.column_name)),
        placeholders(fields.len())
    )
}

/// `UPDATE` of every non-key column; binds non-key values then the key
pub fn update_all(defn: &TableDefn) -> String {
    let table = quote_ident(defn.table_name());
    let key = quote_ident(defn.primary_key().column_name);
    let fields = defn.non_key_fields();
    if fields.is_empty() {
        // Still touches the row so a missing key is reported
        return format!("UPDATE {} SET {} = {} WHERE {} = ?1", table, key, key, key);
    }
    let assignments: Vec<String> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{} = ?{}", quote_ident(f.column_name), i + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        table,
        assignments.join(", "),
        key,
        fields.len() + 1
    )
}

/// `UPDATE` of one column; binds the value then the key
pub fn update_one(defn: &TableDefn, column: &str) -> String {
    format!(
        "UPDATE {} SET {} = ?1 WHERE {} = ?2",
        quote_ident(defn.table_name()),
        quote_ident(column),
        quote_ident(defn.primary_key().column_name)
    )
}

/// `DELETE` of one row by key
pub fn delete_by_key(defn: &TableDefn) -> String {
    format!(
        "DELETE FROM {} WHERE {} = ?1",
        quote_ident(defn.table_name()),
        quote_ident(defn.primary_key().column_name)
    )
}

/// Every junction row, grouped by owner and in stored order within a group
pub fn junction_select(relation: &FieldManyToManyDefn) -> String {
    let this_key = quote_ident(relation.this_key_column);
    let other_key = quote_ident(relation.other_key_column);
    let order = relation
        .order_by_column
        .map(quote_ident)
        .unwrap_or_else(|| other_key.clone());
    format!(
        "SELECT {}, {} FROM {} ORDER BY {}, {}",
        this_key,
        other_key,
        quote_ident(relation.table_name),
        this_key,
        order
    )
}

/// `INSERT` of one junction row; binds owner key, other key and, when
/// ordered, the position
pub fn junction_insert(relation: &FieldManyToManyDefn) -> String {
    let table = quote_ident(relation.table_name);
    match relation.order_by_column {
        Some(order) => format!(
            "INSERT INTO {} ({}) VALUES (?1, ?2, ?3)",
            table,
            column_list([relation.this_key_column, relation.other_key_column, order])
        ),
        None => format!(
            "INSERT INTO {} ({}) VALUES (?1, ?2)",
            table,
            column_list([relation.this_key_column, relation.other_key_column])
        ),
    }
}

/// `DELETE` of every junction row owned by one key
pub fn junction_delete(relation: &FieldManyToManyDefn) -> String {
    format!(
        "DELETE FROM {} WHERE {} = ?1",
        quote_ident(relation.table_name),
        quote_ident(relation.this_key_column)
    )
}
