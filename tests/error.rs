use std::path::PathBuf;

use serde_json::Value;
use taskboard::error::{exit_codes, Error, JsonError};
use taskboard::form::{FormErrors, FormField, CATEGORY_REQUIRED};

#[test]
fn exit_code_user_error() {
    let err = Error::InvalidArgument("bad input".to_string());
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);

    let err = Error::NotFound { kind: "Task", id: 4 };
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    assert!(!err.is_retryable());
}

#[test]
fn exit_code_operation_failed() {
    let err = Error::backend_msg("boom");
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
    assert!(err.is_retryable());
}

#[test]
fn backend_keeps_its_cause() {
    let cause = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
    let err = Error::backend("fetch tasks", cause);
    let source = std::error::Error::source(&err).expect("source");
    assert_eq!(source.to_string(), "reset");
}

#[test]
fn backend_details_carry_the_cause_chain() {
    let inner = Error::backend_msg("Task store: expected value at line 1");
    let err = Error::backend("Failed to load tasks. Please try again.", inner);
    let details = err.details().expect("details");
    assert_eq!(
        details["cause"],
        "Backend error: Task store: expected value at line 1"
    );
    assert!(Error::backend_msg("boom").details().expect("details").get("cause").is_none());
}

#[test]
fn io_errors_become_backend_in_store_context() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err = Error::Io(io).into_backend("Task store");
    assert!(matches!(err, Error::Backend { .. }));
    assert!(err.to_string().contains("Task store"));

    let err = Error::LockFailed(PathBuf::from("tasks.json.lock")).into_backend("Task store");
    assert!(err.is_retryable());
}

#[test]
fn details_include_field_errors() {
    let err = Error::Validation(FormErrors::single(FormField::CategoryId, CATEGORY_REQUIRED));
    let details = err.details().expect("details");
    assert_eq!(details["categoryId"], Value::String(CATEGORY_REQUIRED.to_string()));
    assert_eq!(err.user_message(), "categoryId: Category is required");
}

#[test]
fn details_include_missing_id() {
    let err = Error::NotFound { kind: "Category", id: 12 };
    let details = err.details().expect("details");
    assert_eq!(details["kind"], "Category");
    assert_eq!(details["id"], 12);
}

#[test]
fn json_error_includes_details() {
    let err = Error::InvalidConfig("bad config".to_string());
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    let details = json.details.expect("details");
    assert_eq!(details["message"], Value::String("bad config".to_string()));
}
