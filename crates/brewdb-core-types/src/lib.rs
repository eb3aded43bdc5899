//! Core types shared across brewdb facilities
//!
//! Canonical field keys and event names used by the error and logging
//! facilities, so every crate emits the same structured shape.

pub mod schema;
