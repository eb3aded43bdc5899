#![allow(clippy::unwrap_used, clippy::expect_used)]

use brewdb_core::errors::{ExErrorKind, RecordError};
use brewdb_core::logging_facility::test_capture::init_test_capture;
use brewdb_core::{log_op_end, log_op_error, log_op_start};
use brewdb_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    let starts = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_START)
    });
    assert_eq!(starts, 1, "Should have captured exactly one start event");
}

#[test]
fn test_log_op_end_records_duration_and_table() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42, table = "mash_step");

    let events = capture.events();
    let end_event = events
        .iter()
        .find(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END))
        .expect("Should have end event");

    assert_eq!(end_event.field("duration_ms"), Some("42"));
    assert_eq!(end_event.table.as_deref(), Some("mash_step"));
}

#[test]
fn test_log_op_error_converts_record_error() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = RecordError::NotFound {
        table: "water".to_string(),
        key: 8,
    };
    log_op_error!(op_name, err, duration_ms = 10);

    capture.assert_event_exists(op_name, EVENT_END_ERROR);
    let events = capture.events();
    let error_event = events
        .iter()
        .find(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END_ERROR))
        .expect("Should have error event");

    assert_eq!(error_event.field("err_code"), Some("ERR_NOT_FOUND"));
    assert_eq!(
        error_event.field("err_kind"),
        Some(format!("{:?}", ExErrorKind::NotFound).as_str())
    );
    assert!(error_event
        .field("err_message")
        .is_some_and(|m| m.contains("primary key 8")));
}

#[test]
fn test_boundary_ownership_single_start_end() {
    let capture = init_test_capture();
    let op_name = "test_boundary_ownership_unique_4";

    log_op_start!(op_name, table = "yeast");
    log_op_end!(op_name, duration_ms = 3, table = "yeast");

    let count = |event: &str| {
        capture.count_events(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(event))
    };
    assert_eq!(count(EVENT_START), 1);
    assert_eq!(count(EVENT_END), 1);
    assert_eq!(count(EVENT_END_ERROR), 0);
}

#[test]
#[should_panic(expected = "Expected event")]
fn test_capture_assert_event_exists_fails() {
    let capture = init_test_capture();
    capture.assert_event_exists("nonexistent_op_truly_unique_999", EVENT_START);
}
