//! Descriptor-driven record store
//!
//! One `RecordStore` exists per entity type. It owns the in-memory cache of
//! every live object of that type, keyed by primary key, and keeps it in step
//! with the main table and the junction tables described by its
//! [`TableDefn`].
//!
//! Each write runs in exactly one transaction covering the main-table
//! statement and every junction statement. The cache is only touched, and
//! observers only hear about the change, once that transaction has
//! committed; a failed write leaves both the database and the cache as they
//! were.

use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Instant;

use rusqlite::types::Value as SqlValue;
use rusqlite::OptionalExtension;

use brewdb_core::descriptor::{FieldManyToManyDefn, FieldSimpleDefn, FieldType, TableDefn};
use brewdb_core::errors::RecordError;
use brewdb_core::{
    handle, log_op_end, log_op_error, log_op_start, Handle, NamedParameterBundle, Persisted,
    StoreEvent, StoreObserver, Value,
};

use crate::column;
use crate::db::Database;
use crate::errors::{statement_error, Result};
use crate::junction;
use crate::sql;
use crate::transaction::TransactionScope;

enum Target<'d> {
    Column(&'d FieldSimpleDefn),
    Relation(&'d FieldManyToManyDefn),
}

/// Cache plus persistence engine for one entity type
pub struct RecordStore<T: Persisted> {
    db: Database,
    defn: TableDefn,
    cache: BTreeMap<i64, Handle<T>>,
    observers: Vec<Rc<dyn StoreObserver>>,
}

impl<T: Persisted> RecordStore<T> {
    /// Create an empty store over `db`; call [`load_all`](Self::load_all) to fill it
    pub fn new(db: Database, defn: TableDefn) -> Self {
        tracing::debug!(
            component = module_path!(),
            table = defn.table_name(),
            simple_fields = defn.simple_fields().len(),
            relations = defn.many_to_many_fields().len(),
            "Created record store"
        );
        Self {
            db,
            defn,
            cache: BTreeMap::new(),
            observers: Vec::new(),
        }
    }

    pub fn table_defn(&self) -> &TableDefn {
        &self.defn
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Register an observer for insert and delete events
    pub fn subscribe(&mut self, observer: Rc<dyn StoreObserver>) {
        self.observers.push(observer);
    }

    // ---------------------------------------------------------------------
    // Cache queries
    // ---------------------------------------------------------------------

    pub fn contains(&self, id: i64) -> bool {
        self.cache.contains_key(&id)
    }

    pub fn get_by_id(&self, id: i64) -> Option<Handle<T>> {
        self.cache.get(&id).cloned()
    }

    /// Every cached object in key order
    pub fn get_all(&self) -> Vec<Handle<T>> {
        self.cache.values().cloned().collect()
    }

    pub fn keys(&self) -> Vec<i64> {
        self.cache.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// First cached object, in key order, for which `predicate` holds
    pub fn find_matching<F>(&self, predicate: F) -> Option<Handle<T>>
    where
        F: Fn(&T) -> bool,
    {
        self.cache
            .values()
            .find(|object| predicate(&object.borrow()))
            .cloned()
    }

    /// Every cached object, in key order, for which `predicate` holds
    pub fn find_all_matching<F>(&self, predicate: F) -> Vec<Handle<T>>
    where
        F: Fn(&T) -> bool,
    {
        self.cache
            .values()
            .filter(|object| predicate(&object.borrow()))
            .cloned()
            .collect()
    }

    // ---------------------------------------------------------------------
    // Persistence operations
    // ---------------------------------------------------------------------

    /// Replace the cache with every row of the main table
    ///
    /// Objects are built with [`Persisted::from_bundle`], then each relation
    /// is applied from its junction table. Junction rows whose owner is not
    /// in the main table are skipped with a warning. Returns the number of
    /// objects loaded.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateKey` if two rows share a primary key, or any
    /// decoding or database error. On error the previous cache is kept.
    pub fn load_all(&mut self) -> Result<usize> {
        let started = Instant::now();
        log_op_start!("load_all", table = self.defn.table_name());

        let result = self.read_all().map(|loaded| {
            let count = loaded.len();
            self.cache = loaded;
            count
        });
        if let Ok(count) = &result {
            tracing::debug!(
                component = module_path!(),
                table = self.defn.table_name(),
                row_count = *count,
                "Loaded objects"
            );
        }
        self.finish_op("load_all", started, result)
    }

    /// Insert a transient object, returning its new primary key
    ///
    /// The key is written back onto the object before the transaction
    /// commits, and the object is cached under it once it has.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyPersisted` if the object already has a key,
    /// `MissingGeneratedKey` if the database assigned none, the object's own
    /// error if it rejects the new key, or any encoding or database error.
    /// On error nothing is written, nothing is cached and the object keeps
    /// its previous key.
    pub fn insert(&mut self, object: &Handle<T>) -> Result<i64> {
        let started = Instant::now();
        log_op_start!("insert", table = self.defn.table_name());

        let result = self.write_insert(object).map(|key| {
            self.cache.insert(key, Rc::clone(object));
            self.notify(StoreEvent::Inserted {
                table: self.defn.table_name(),
                key,
            });
            key
        });
        self.finish_op("insert", started, result)
    }

    /// Write every field and relation of a persisted object
    ///
    /// Relations are resynchronised by deleting the object's junction rows and
    /// writing them again from its current lists.
    ///
    /// # Errors
    ///
    /// Returns `NotPersisted` if the object has no key, `NotFound` if no row
    /// has its key, or any encoding or database error.
    pub fn update(&mut self, object: &Handle<T>) -> Result<()> {
        let started = Instant::now();
        log_op_start!("update", table = self.defn.table_name());

        let result = self.write_update(object).map(|key| self.recache(key, object));
        self.finish_op("update", started, result)
    }

    /// Write one property of a persisted object
    ///
    /// # Errors
    ///
    /// Returns `PrimaryKeyImmutable` for the key property, `UnknownProperty`
    /// for a property with no descriptor, `NotPersisted` or `NotFound` as for
    /// [`update`](Self::update), or any encoding or database error.
    pub fn update_property(&mut self, object: &Handle<T>, property: &str) -> Result<()> {
        let started = Instant::now();
        log_op_start!("update_property", table = self.defn.table_name(), property);

        let result = self
            .write_property(object, property)
            .map(|key| self.recache(key, object));
        self.finish_op("update_property", started, result)
    }

    /// Drop an object from the cache, leaving its row in the database
    pub fn soft_delete(&mut self, id: i64) -> Option<Handle<T>> {
        let started = Instant::now();
        log_op_start!("soft_delete", table = self.defn.table_name(), primary_key = id);

        let removed = self.cache.remove(&id);
        if removed.is_some() {
            self.notify(StoreEvent::Deleted {
                table: self.defn.table_name(),
                key: id,
                hard: false,
            });
        }
        log_op_end!(
            "soft_delete",
            duration_ms = started.elapsed().as_millis() as u64,
            table = self.defn.table_name(),
            primary_key = id,
            found = removed.is_some()
        );
        removed
    }

    /// Delete an object's row and junction rows, and drop it from the cache
    ///
    /// Returns whether a main-table row was deleted.
    ///
    /// # Errors
    ///
    /// Returns any database error; the row, junction rows and cache entry are
    /// then all still present.
    pub fn hard_delete(&mut self, id: i64) -> Result<bool> {
        let started = Instant::now();
        log_op_start!("hard_delete", table = self.defn.table_name(), primary_key = id);

        let result = self.write_delete(id).map(|removed| {
            let was_cached = self.cache.remove(&id).is_some();
            if removed || was_cached {
                self.notify(StoreEvent::Deleted {
                    table: self.defn.table_name(),
                    key: id,
                    hard: true,
                });
            }
            removed
        });
        self.finish_op("hard_delete", started, result)
    }

    // ---------------------------------------------------------------------
    // Transactional bodies; none of these touch the cache
    // ---------------------------------------------------------------------

    fn read_all(&self) -> Result<BTreeMap<i64, Handle<T>>> {
        let mut guard = self.db.connection_mut()?;
        let scope = TransactionScope::begin(&mut guard, "load_all")?;
        let conn = scope.connection()?;
        let pk = self.defn.primary_key();

        let mut loaded: BTreeMap<i64, Handle<T>> = BTreeMap::new();
        {
            let statement = sql::select_all(&self.defn);
            let mut stmt = conn
                .prepare(&statement)
                .map_err(|e| statement_error(&statement, e))?;
            let mut rows = stmt.query([]).map_err(|e| statement_error(&statement, e))?;
            while let Some(row) = rows.next().map_err(|e| statement_error(&statement, e))? {
                let mut bundle = NamedParameterBundle::new();
                for (index, field) in self.defn.simple_fields().iter().enumerate() {
                    let raw = row
                        .get_ref(index)
                        .map_err(|e| statement_error(&statement, e))?;
                    bundle.insert(field.property_name, column::from_sql(field, raw)?)?;
                }

                let key: i64 = bundle.val(pk.property_name)?;
                if loaded.contains_key(&key) {
                    return Err(RecordError::DuplicatePrimaryKey {
                        table: self.defn.table_name().to_string(),
                        key,
                    }
                    .into());
                }
                loaded.insert(key, handle(T::from_bundle(&bundle)?));
            }
        }

        for relation in self.defn.many_to_many_fields() {
            for (this_key, others) in junction::read_relations(conn, relation)? {
                let Some(object) = loaded.get(&this_key) else {
                    tracing::warn!(
                        component = module_path!(),
                        table = self.defn.table_name(),
                        junction = relation.table_name,
                        primary_key = this_key,
                        "Junction rows reference a missing object; skipping"
                    );
                    continue;
                };
                let value = if relation.assume_max_one_entry {
                    others.into_iter().next().unwrap_or(Value::Null)
                } else {
                    Value::List(others)
                };
                object
                    .borrow_mut()
                    .set_field(relation.property_name, value)?;
            }
        }

        scope.commit()?;
        Ok(loaded)
    }

    fn write_insert(&self, object: &Handle<T>) -> Result<i64> {
        let pk = self.defn.primary_key();
        let (current, previous_key, values, relations) = {
            let object = object.borrow();
            (
                self.key_of(&object)?,
                object.get_field(pk.property_name).unwrap_or(Value::Null),
                self.column_values(&object)?,
                self.relation_values(&object)?,
            )
        };
        if current > 0 {
            return Err(RecordError::AlreadyPersisted {
                table: self.defn.table_name().to_string(),
                key: current,
            }
            .into());
        }

        let mut guard = self.db.connection_mut()?;
        let scope = TransactionScope::begin(&mut guard, "insert")?;
        scope.execute(
            &sql::insert(&self.defn),
            rusqlite::params_from_iter(values.iter()),
        )?;

        let key = scope.connection()?.last_insert_rowid();
        if key <= 0 {
            return Err(RecordError::MissingGeneratedKey {
                table: self.defn.table_name().to_string(),
            }
            .into());
        }
        if self.cache.contains_key(&key) {
            return Err(RecordError::DuplicatePrimaryKey {
                table: self.defn.table_name().to_string(),
                key,
            }
            .into());
        }

        for (relation, value) in self.defn.many_to_many_fields().iter().zip(&relations) {
            junction::insert_relation(scope.connection()?, relation, key, value)?;
        }

        let key_value = match pk.field_type {
            FieldType::UInt => Value::UInt(key as u64),
            _ => Value::Int(key),
        };
        object.borrow_mut().set_field(pk.property_name, key_value)?;
        if let Err(err) = scope.commit() {
            self.restore_key(object, previous_key);
            return Err(err);
        }
        Ok(key)
    }

    fn write_update(&self, object: &Handle<T>) -> Result<i64> {
        let (key, mut values, relations) = {
            let object = object.borrow();
            (
                self.key_of(&object)?,
                self.column_values(&object)?,
                self.relation_values(&object)?,
            )
        };
        self.require_persisted(key)?;
        values.push(SqlValue::Integer(key));

        let mut guard = self.db.connection_mut()?;
        let scope = TransactionScope::begin(&mut guard, "update")?;
        let changed = scope.execute(
            &sql::update_all(&self.defn),
            rusqlite::params_from_iter(values.iter()),
        )?;
        if changed == 0 {
            return Err(self.not_found(key));
        }

        for (relation, value) in self.defn.many_to_many_fields().iter().zip(&relations) {
            junction::replace_relation(scope.connection()?, relation, key, value)?;
        }

        scope.commit()?;
        Ok(key)
    }

    fn write_property(&self, object: &Handle<T>, property: &str) -> Result<i64> {
        let key = self.key_of(&object.borrow())?;
        self.require_persisted(key)?;

        if property == self.defn.primary_key().property_name {
            return Err(RecordError::PrimaryKeyImmutable {
                table: self.defn.table_name().to_string(),
                property: property.to_string(),
            }
            .into());
        }
        let target = match (
            self.defn.simple_field(property),
            self.defn.many_to_many_field(property),
        ) {
            (Some(field), _) => Target::Column(field),
            (None, Some(relation)) => Target::Relation(relation),
            (None, None) => return Err(unknown_property(property)),
        };
        let value = object
            .borrow()
            .get_field(property)
            .ok_or_else(|| unknown_property(property))?;

        let mut guard = self.db.connection_mut()?;
        let scope = TransactionScope::begin(&mut guard, "update_property")?;
        match target {
            Target::Column(field) => {
                let changed = scope.execute(
                    &sql::update_one(&self.defn, field.column_name),
                    rusqlite::params![column::to_sql(field, &value)?, key],
                )?;
                if changed == 0 {
                    return Err(self.not_found(key));
                }
            }
            Target::Relation(relation) => {
                let conn = scope.connection()?;
                let statement = sql::exists_by_key(&self.defn);
                let exists = conn
                    .query_row(&statement, [key], |_| Ok(()))
                    .optional()
                    .map_err(|e| statement_error(&statement, e))?
                    .is_some();
                if !exists {
                    return Err(self.not_found(key));
                }
                junction::replace_relation(conn, relation, key, &value)?;
            }
        }

        scope.commit()?;
        Ok(key)
    }

    fn write_delete(&self, id: i64) -> Result<bool> {
        let mut guard = self.db.connection_mut()?;
        let scope = TransactionScope::begin(&mut guard, "hard_delete")?;

        for relation in self.defn.many_to_many_fields() {
            junction::delete_relation(scope.connection()?, relation, id)?;
        }
        let deleted = scope.execute(&sql::delete_by_key(&self.defn), [id])?;

        scope.commit()?;
        Ok(deleted > 0)
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    /// Primary key of `object`; an absent (null) key reads as 0
    fn key_of(&self, object: &T) -> Result<i64> {
        let pk = self.defn.primary_key();
        match object.get_field(pk.property_name) {
            None => Err(unknown_property(pk.property_name)),
            Some(Value::Null) => Ok(0),
            Some(value) => Ok(value.to::<i64>(pk.property_name)?),
        }
    }

    fn require_persisted(&self, key: i64) -> Result<()> {
        if key <= 0 {
            return Err(RecordError::NotPersisted {
                table: self.defn.table_name().to_string(),
                key,
            }
            .into());
        }
        Ok(())
    }

    fn not_found(&self, key: i64) -> brewdb_core::ExError {
        RecordError::NotFound {
            table: self.defn.table_name().to_string(),
            key,
        }
        .into()
    }

    /// Encoded non-key column values, in descriptor order
    fn column_values(&self, object: &T) -> Result<Vec<SqlValue>> {
        self.defn
            .non_key_fields()
            .iter()
            .map(|field| {
                let value = object
                    .get_field(field.property_name)
                    .ok_or_else(|| unknown_property(field.property_name))?;
                column::to_sql(field, &value)
            })
            .collect()
    }

    /// Current relation values, in descriptor order
    fn relation_values(&self, object: &T) -> Result<Vec<Value>> {
        self.defn
            .many_to_many_fields()
            .iter()
            .map(|relation| {
                object
                    .get_field(relation.property_name)
                    .ok_or_else(|| unknown_property(relation.property_name))
            })
            .collect()
    }

    /// Put back the key an object held before a failed insert
    fn restore_key(&self, object: &Handle<T>, previous: Value) {
        let pk = self.defn.primary_key().property_name;
        if let Err(err) = object.borrow_mut().set_field(pk, previous) {
            tracing::warn!(
                component = module_path!(),
                table = self.defn.table_name(),
                error = %err,
                "Could not restore key after failed insert"
            );
        }
    }

    /// Point the cache entry for `key` at `object` if a different handle holds it
    fn recache(&mut self, key: i64, object: &Handle<T>) {
        if let Some(cached) = self.cache.get_mut(&key) {
            if !Rc::ptr_eq(cached, object) {
                *cached = Rc::clone(object);
            }
        }
    }

    fn notify(&self, event: StoreEvent) {
        for observer in &self.observers {
            observer.on_event(&event);
        }
    }

    fn finish_op<R>(&self, op: &'static str, started: Instant, result: Result<R>) -> Result<R> {
        let duration_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(value) => {
                log_op_end!(op, duration_ms = duration_ms, table = self.defn.table_name());
                Ok(value)
            }
            Err(err) => {
                let err = err.in_context(op, self.defn.table_name());
                log_op_error!(op, err.clone(), duration_ms = duration_ms, table = self.defn.table_name());
                Err(err)
            }
        }
    }
}

fn unknown_property(property: &str) -> brewdb_core::ExError {
    RecordError::UnknownProperty {
        property: property.to_string(),
    }
    .into()
}
