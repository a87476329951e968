//! Error types for taskboard
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (invalid input, unknown id, bad configuration)
//! - 4: Operation failed (store backend, I/O)

use std::path::PathBuf;
use thiserror::Error;

use crate::form::FormErrors;
use crate::store::RecordId;

/// Exit codes for the taskboard CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for taskboard operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Validation failed: {0}")]
    Validation(FormErrors),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: RecordId },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Operation failures (exit code 4)
    #[error("Backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),
}

impl Error {
    /// Wrap a storage or transport failure, keeping the original cause.
    pub fn backend<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    /// A backend failure with no underlying error value.
    pub fn backend_msg(message: impl Into<String>) -> Self {
        Error::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Convert a store-layer failure into a `Backend` error.
    ///
    /// Domain errors pass through unchanged.
    pub fn into_backend(self, context: &str) -> Self {
        match self {
            Error::Io(err) => Error::backend(format!("{context}: {err}"), err),
            Error::Json(err) => Error::backend(format!("{context}: {err}"), err),
            Error::LockFailed(path) => {
                Error::backend_msg(format!("{context}: lock busy at {}", path.display()))
            }
            other => other,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_)
            | Error::NotFound { .. }
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::TomlParse(_) => exit_codes::USER_ERROR,

            Error::Backend { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Backend failures are transient from the caller's point of view.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Backend { .. } | Error::LockFailed(_))
    }

    /// Message suitable for showing to a user in place of the raw error.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(errors) => errors.summary(),
            Error::NotFound { kind, id } => format!("{kind} {id} no longer exists"),
            Error::Backend { .. } | Error::LockFailed(_) => {
                "Something went wrong talking to the task store. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }

    /// Structured details for machine-readable output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::Validation(errors) => serde_json::to_value(errors).ok(),
            Error::NotFound { kind, id } => Some(serde_json::json!({
                "kind": kind,
                "id": id,
            })),
            Error::InvalidConfig(message) | Error::InvalidArgument(message) => {
                Some(serde_json::json!({ "message": message }))
            }
            Error::Backend { message, source } => {
                let mut details = serde_json::json!({
                    "message": message,
                    "retryable": true,
                });
                if let Some(cause) = source {
                    details["cause"] = serde_json::Value::String(cause_chain(cause.as_ref()));
                }
                Some(details)
            }
            Error::LockFailed(path) => Some(serde_json::json!({
                "path": path.display().to_string(),
                "retryable": true,
            })),
            _ => None,
        }
    }
}

/// `cause: its cause: ...` down to the root error
pub fn cause_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut next = err.source();
    while let Some(cause) = next {
        parts.push(cause.to_string());
        next = cause.source();
    }
    parts.join(": ")
}

impl From<FormErrors> for Error {
    fn from(errors: FormErrors) -> Self {
        Error::Validation(errors)
    }
}

/// Result type alias for taskboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
