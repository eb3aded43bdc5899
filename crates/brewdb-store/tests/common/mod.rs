//! Shared fixtures: three small brewing entities, their descriptors and schema

#![allow(dead_code)]

use chrono::NaiveDate;

use brewdb_core::descriptor::{EnumAndItsDbString, FieldManyToManyDefn, FieldSimpleDefn, FieldType};
use brewdb_core::errors::{RecordError, Result};
use brewdb_core::{NamedParameterBundle, Persisted, TableDefn, Value};
use brewdb_store::{Database, RecordStore};

pub const SCHEMA: &str = "
    CREATE TABLE fermentable (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        name      TEXT NOT NULL,
        yield_pct REAL NOT NULL
    );
    CREATE TABLE hop (
        id    INTEGER PRIMARY KEY AUTOINCREMENT,
        name  TEXT NOT NULL,
        alpha REAL NOT NULL,
        form  TEXT
    );
    CREATE TABLE style (
        id   INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    );
    CREATE TABLE recipe (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        name      TEXT NOT NULL,
        brew_date TEXT,
        is_mashed INTEGER NOT NULL
    );
    CREATE TABLE recipe_hop (
        recipe_id INTEGER NOT NULL REFERENCES recipe(id),
        hop_id    INTEGER NOT NULL REFERENCES hop(id),
        \"order\" INTEGER NOT NULL
    );
    CREATE TABLE recipe_style (
        recipe_id INTEGER NOT NULL REFERENCES recipe(id),
        style_id  INTEGER NOT NULL REFERENCES style(id)
    );
";

/// In-memory database with the fixture schema
pub fn setup_test_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.execute_batch(SCHEMA).unwrap();
    db
}

/// Run a single-value query directly against the database
pub fn query_i64(db: &Database, sql: &str) -> i64 {
    db.connection()
        .unwrap()
        .query_row(sql, [], |row| row.get(0))
        .unwrap()
}

pub fn execute(db: &Database, sql: &str) {
    db.connection().unwrap().execute_batch(sql).unwrap();
}

fn unknown(property: &str) -> RecordError {
    RecordError::UnknownProperty {
        property: property.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Fermentable: scalar fields only
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Fermentable {
    pub key: i64,
    pub name: String,
    pub yield_pct: f64,
}

impl Fermentable {
    pub fn new(name: &str, yield_pct: f64) -> Self {
        Self {
            key: 0,
            name: name.to_string(),
            yield_pct,
        }
    }
}

impl Persisted for Fermentable {
    fn from_bundle(bundle: &NamedParameterBundle) -> Result<Self> {
        Ok(Self {
            key: bundle.val("key")?,
            name: bundle.val("name")?,
            yield_pct: bundle.val("yield_pct")?,
        })
    }

    fn get_field(&self, property: &str) -> Option<Value> {
        match property {
            "key" => Some(self.key.into()),
            "name" => Some(self.name.as_str().into()),
            "yield_pct" => Some(self.yield_pct.into()),
            _ => None,
        }
    }

    fn set_field(&mut self, property: &str, value: Value) -> Result<()> {
        match property {
            "key" => self.key = value.to(property)?,
            "name" => self.name = value.to(property)?,
            "yield_pct" => self.yield_pct = value.to(property)?,
            _ => return Err(unknown(property)),
        }
        Ok(())
    }
}

pub fn fermentable_defn(table_name: &'static str) -> TableDefn {
    TableDefn::new(
        table_name,
        vec![
            FieldSimpleDefn::new(FieldType::Int, "id", "key"),
            FieldSimpleDefn::new(FieldType::String, "name", "name"),
            FieldSimpleDefn::new(FieldType::Double, "yield_pct", "yield_pct"),
        ],
        vec![],
    )
    .unwrap()
}

pub fn fermentable_store(db: &Database) -> RecordStore<Fermentable> {
    RecordStore::new(db.clone(), fermentable_defn("fermentable"))
}

// ---------------------------------------------------------------------------
// Hop: carries an enum column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopForm {
    Pellet = 0,
    Plug = 1,
    Leaf = 2,
    /// Present in the domain but deliberately absent from the mapping
    Extract = 3,
}

impl HopForm {
    fn from_native(native: i32) -> Self {
        match native {
            1 => HopForm::Plug,
            2 => HopForm::Leaf,
            3 => HopForm::Extract,
            _ => HopForm::Pellet,
        }
    }
}

pub static HOP_FORMS: [EnumAndItsDbString; 3] = [
    EnumAndItsDbString::new(HopForm::Pellet as i32, "Pellet"),
    EnumAndItsDbString::new(HopForm::Plug as i32, "Plug"),
    EnumAndItsDbString::new(HopForm::Leaf as i32, "Leaf"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Hop {
    pub key: i64,
    pub name: String,
    pub alpha_pct: f64,
    pub form: HopForm,
}

impl Hop {
    pub fn new(name: &str, alpha_pct: f64, form: HopForm) -> Self {
        Self {
            key: 0,
            name: name.to_string(),
            alpha_pct,
            form,
        }
    }
}

impl Persisted for Hop {
    fn from_bundle(bundle: &NamedParameterBundle) -> Result<Self> {
        Ok(Self {
            key: bundle.val("key")?,
            name: bundle.val("name")?,
            alpha_pct: bundle.val("alpha_pct")?,
            form: HopForm::from_native(bundle.val_or::<Option<i32>>("form", None)?.unwrap_or(0)),
        })
    }

    fn get_field(&self, property: &str) -> Option<Value> {
        match property {
            "key" => Some(self.key.into()),
            "name" => Some(self.name.as_str().into()),
            "alpha_pct" => Some(self.alpha_pct.into()),
            "form" => Some(Value::Enum(self.form as i32)),
            _ => None,
        }
    }

    fn set_field(&mut self, property: &str, value: Value) -> Result<()> {
        match property {
            "key" => self.key = value.to(property)?,
            "name" => self.name = value.to(property)?,
            "alpha_pct" => self.alpha_pct = value.to(property)?,
            "form" => self.form = HopForm::from_native(value.to(property)?),
            _ => return Err(unknown(property)),
        }
        Ok(())
    }
}

pub fn hop_defn() -> TableDefn {
    TableDefn::new(
        "hop",
        vec![
            FieldSimpleDefn::new(FieldType::Int, "id", "key"),
            FieldSimpleDefn::new(FieldType::String, "name", "name"),
            FieldSimpleDefn::new(FieldType::Double, "alpha", "alpha_pct"),
            FieldSimpleDefn::enumeration("form", "form", &HOP_FORMS),
        ],
        vec![],
    )
    .unwrap()
}

pub fn hop_store(db: &Database) -> RecordStore<Hop> {
    RecordStore::new(db.clone(), hop_defn())
}

// ---------------------------------------------------------------------------
// Recipe: date and bool columns plus two relations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub key: i64,
    pub name: String,
    pub brew_date: Option<NaiveDate>,
    pub is_mashed: bool,
    /// Ordered hop additions
    pub hops: Vec<i64>,
    /// At most one style
    pub style: Option<i64>,
}

impl Recipe {
    pub fn new(name: &str) -> Self {
        Self {
            key: 0,
            name: name.to_string(),
            brew_date: None,
            is_mashed: true,
            hops: Vec::new(),
            style: None,
        }
    }
}

impl Persisted for Recipe {
    fn from_bundle(bundle: &NamedParameterBundle) -> Result<Self> {
        Ok(Self {
            key: bundle.val("key")?,
            name: bundle.val("name")?,
            brew_date: bundle.val("brew_date")?,
            is_mashed: bundle.val("is_mashed")?,
            hops: bundle.val_or("hops", Vec::new())?,
            style: bundle.val_or("style", None)?,
        })
    }

    fn get_field(&self, property: &str) -> Option<Value> {
        match property {
            "key" => Some(self.key.into()),
            "name" => Some(self.name.as_str().into()),
            "brew_date" => Some(self.brew_date.into()),
            "is_mashed" => Some(self.is_mashed.into()),
            "hops" => Some(Value::key_list(self.hops.iter().copied())),
            "style" => Some(self.style.into()),
            _ => None,
        }
    }

    fn set_field(&mut self, property: &str, value: Value) -> Result<()> {
        match property {
            "key" => self.key = value.to(property)?,
            "name" => self.name = value.to(property)?,
            "brew_date" => self.brew_date = value.to(property)?,
            "is_mashed" => self.is_mashed = value.to(property)?,
            "hops" => self.hops = value.to(property)?,
            "style" => self.style = value.to(property)?,
            _ => return Err(unknown(property)),
        }
        Ok(())
    }
}

pub const RECIPE_HOPS: FieldManyToManyDefn =
    FieldManyToManyDefn::new("recipe_hop", "hops", "recipe_id", "hop_id").ordered_by("order");

pub const RECIPE_STYLE: FieldManyToManyDefn =
    FieldManyToManyDefn::new("recipe_style", "style", "recipe_id", "style_id").max_one_entry();

pub fn recipe_defn() -> TableDefn {
    TableDefn::new(
        "recipe",
        vec![
            FieldSimpleDefn::new(FieldType::Int, "id", "key"),
            FieldSimpleDefn::new(FieldType::String, "name", "name"),
            FieldSimpleDefn::new(FieldType::Date, "brew_date", "brew_date"),
            FieldSimpleDefn::new(FieldType::Bool, "is_mashed", "is_mashed"),
        ],
        vec![RECIPE_HOPS, RECIPE_STYLE],
    )
    .unwrap()
}

pub fn recipe_store(db: &Database) -> RecordStore<Recipe> {
    RecordStore::new(db.clone(), recipe_defn())
}

/// Insert one pellet hop per name and return the keys in insertion order
pub fn seed_hops(db: &Database, names: &[&str]) -> Vec<i64> {
    let mut hops = hop_store(db);
    names
        .iter()
        .map(|name| {
            hops.insert(&brewdb_core::handle(Hop::new(name, 5.0, HopForm::Pellet)))
                .unwrap()
        })
        .collect()
}

/// Insert styles directly and return their keys
pub fn seed_styles(db: &Database, names: &[&str]) -> Vec<i64> {
    names
        .iter()
        .map(|name| {
            let conn = db.connection().unwrap();
            conn.execute("INSERT INTO style (name) VALUES (?1)", [name])
                .unwrap();
            conn.last_insert_rowid()
        })
        .collect()
}
