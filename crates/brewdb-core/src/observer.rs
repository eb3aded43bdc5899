//! Store observers
//!
//! A record store reports changes to its cache through `StoreObserver`s
//! registered by UI or domain code. Events are delivered only after the
//! change is final: inserts and hard deletes after their transaction has
//! committed, soft deletes after the cache entry is gone.

use std::cell::RefCell;

/// A change to a store's cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A new object was committed and cached under `key`
    Inserted { table: &'static str, key: i64 },
    /// An object left the cache; `hard` when its row was also deleted
    Deleted {
        table: &'static str,
        key: i64,
        hard: bool,
    },
}

impl StoreEvent {
    pub fn key(&self) -> i64 {
        match self {
            StoreEvent::Inserted { key, .. } | StoreEvent::Deleted { key, .. } => *key,
        }
    }
}

/// Receiver of store events
pub trait StoreObserver {
    fn on_event(&self, event: &StoreEvent);
}

impl<F: Fn(&StoreEvent)> StoreObserver for F {
    fn on_event(&self, event: &StoreEvent) {
        self(event)
    }
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StoreObserver for NoopObserver {
    fn on_event(&self, _event: &StoreEvent) {}
}

/// Observer that records events for later inspection
///
/// # Example
/// ```
/// use brewdb_core::observer::{EventLog, StoreEvent, StoreObserver};
///
/// let log = EventLog::new();
/// log.on_event(&StoreEvent::Inserted { table: "hop", key: 1 });
/// assert_eq!(log.inserted_keys(), vec![1]);
/// ```
#[derive(Debug, Default)]
pub struct EventLog {
    events: RefCell<Vec<StoreEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.events.borrow().clone()
    }

    pub fn inserted_keys(&self) -> Vec<i64> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                StoreEvent::Inserted { key, .. } => Some(*key),
                StoreEvent::Deleted { .. } => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl StoreObserver for EventLog {
    fn on_event(&self, event: &StoreEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
