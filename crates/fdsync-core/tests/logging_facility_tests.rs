#![allow(clippy::unwrap_used, clippy::expect_used)]

use fdsync_core::errors::{ExError, ExErrorKind};
use fdsync_core::logging_facility::test_capture::init_test_capture;
use fdsync_core::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use fdsync_core::{log_op_end, log_op_error, log_op_start};

#[test]
fn test_log_op_start_carries_extra_fields() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name, period = 2024);

    let start = capture.find(op_name, EVENT_START).expect("start event captured");
    assert_eq!(start.field("period"), Some("2024"));
    assert!(start.component().is_some());
}

#[test]
fn test_log_op_end_records_duration_once() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let ends = capture.count_events(|e| e.op() == Some(op_name) && e.event() == Some(EVENT_END));
    assert_eq!(ends, 1);
    let end = capture.find(op_name, EVENT_END).unwrap();
    assert_eq!(end.field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_carries_kind_code_and_class() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = ExError::new(ExErrorKind::CommitFailed).with_message("cache unreachable");
    log_op_error!(op_name, err, duration_ms = 10);

    let event = capture
        .find(op_name, EVENT_END_ERROR)
        .expect("error event captured");
    assert_eq!(event.field("err.code"), Some("ERR_COMMIT_FAILED"));
    assert_eq!(event.field("err.class"), Some("commit"));
    assert_eq!(event.field("err.kind"), Some("CommitFailed"));
    assert_eq!(event.level, tracing::Level::ERROR);
}

#[test]
fn test_log_op_error_does_not_consume_error() {
    let _capture = init_test_capture();
    let err = ExError::new(ExErrorKind::DuplicateLink);

    log_op_error!("test_log_op_error_unique_4", err, duration_ms = 1);

    assert!(err.is_row_recoverable());
}

#[test]
fn test_events_for_run_filters_on_run_id() {
    let capture = init_test_capture();

    tracing::info!(run_id = "run-unique-5", "first");
    tracing::info!(run_id = "run-unique-5", "second");
    tracing::info!(run_id = "run-unique-6", "other");

    assert_eq!(capture.events_for_run("run-unique-5").len(), 2);
}
