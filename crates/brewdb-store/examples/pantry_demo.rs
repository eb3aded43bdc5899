//! Ingredient pantry walkthrough
//!
//! Run with `RUST_LOG=brewdb=debug` to see every statement boundary.

use std::rc::Rc;

use brewdb_core::descriptor::{FieldSimpleDefn, FieldType};
use brewdb_core::errors::{RecordError, Result as RecordResult};
use brewdb_core::logging_facility::{init, Profile};
use brewdb_core::{handle, NamedParameterBundle, Persisted, StoreEvent, TableDefn, Value};
use brewdb_store::{Database, RecordStore, Result};

#[derive(Debug)]
struct Misc {
    key: i64,
    name: String,
    amount_g: f64,
}

impl Persisted for Misc {
    fn from_bundle(bundle: &NamedParameterBundle) -> RecordResult<Self> {
        Ok(Self {
            key: bundle.val("key")?,
            name: bundle.val("name")?,
            amount_g: bundle.val_or("amount_g", 0.0)?,
        })
    }

    fn get_field(&self, property: &str) -> Option<Value> {
        match property {
            "key" => Some(self.key.into()),
            "name" => Some(self.name.as_str().into()),
            "amount_g" => Some(self.amount_g.into()),
            _ => None,
        }
    }

    fn set_field(&mut self, property: &str, value: Value) -> RecordResult<()> {
        match property {
            "key" => self.key = value.to(property)?,
            "name" => self.name = value.to(property)?,
            "amount_g" => self.amount_g = value.to(property)?,
            _ => {
                return Err(RecordError::UnknownProperty {
                    property: property.to_string(),
                })
            }
        }
        Ok(())
    }
}

fn main() {
    init(Profile::Development);

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let db = Database::open_in_memory()?;
    db.execute_batch(
        "CREATE TABLE misc (id INTEGER PRIMARY KEY, name TEXT NOT NULL, amount_g REAL NOT NULL);",
    )?;

    let defn = TableDefn::new(
        "misc",
        vec![
            FieldSimpleDefn::new(FieldType::Int, "id", "key"),
            FieldSimpleDefn::new(FieldType::String, "name", "name"),
            FieldSimpleDefn::new(FieldType::Double, "amount_g", "amount_g"),
        ],
        vec![],
    )?;
    let mut pantry: RecordStore<Misc> = RecordStore::new(db, defn);
    pantry.subscribe(Rc::new(|event: &StoreEvent| println!("event: {:?}", event)));
    pantry.load_all()?;

    for (name, grams) in [("Irish Moss", 5.0), ("Gypsum", 12.0), ("Coriander", 20.0)] {
        let misc = Misc {
            key: 0,
            name: name.to_string(),
            amount_g: grams,
        };
        pantry.insert(&handle(misc))?;
    }

    if let Some(gypsum) = pantry.find_matching(|m| m.name == "Gypsum") {
        gypsum.borrow_mut().amount_g -= 4.0;
        pantry.update_property(&gypsum, "amount_g")?;
    }

    for misc in pantry.get_all() {
        let misc = misc.borrow();
        println!("{:>3}  {:<12} {:>6.1} g", misc.key, misc.name, misc.amount_g);
    }
    Ok(())
}
