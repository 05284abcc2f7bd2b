//! Shared primitives for all Rust crates in Rolekeeper.

#![forbid(unsafe_code)]

/// Acting identity and request context carried into audited operations.
pub mod context;
/// Strongly typed identifiers.
pub mod ids;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use context::{Actor, OperationContext, RequestContext};
pub use ids::{AssignmentId, AuditRecordId, PrincipalId, RoleId};

/// Result type used across Rolekeeper crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string. Surrounding whitespace is trimmed.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniquely named resource already exists.
    #[error("duplicate name: {0}")]
    DuplicateName(String),

    /// Resource is still referenced by active state and cannot be removed.
    #[error("in use: {0}")]
    InUse(String),

    /// Write operation conflicts with concurrent state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Principal is blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// An audit sink rejected a record.
    #[error("audit sink failure: {0}")]
    AuditSink(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
