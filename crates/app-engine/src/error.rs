use std::time::Duration;

use thiserror::Error;

use app_spec::{SchemaError, ValidationResult};

/// Failure reported by an external integration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("{0} is unavailable")]
    Unavailable(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("collaborator panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error("submission rejected: invalid fields {}", .0.failing_fields().join(", "))]
    Validation(ValidationResult),
    #[error("app '{0}' not found")]
    NotFound(String),
    #[error("document store failed: {0}")]
    Store(#[from] CollaboratorError),
    #[error("stored document is invalid: {0}")]
    Schema(#[from] SchemaError),
}
