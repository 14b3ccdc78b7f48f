//! Error types shared by the repository, the recurrence generator and storage.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Input was rejected before any state changed.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// An operation referenced a task id that is not in the repository.
    #[error("task not found: {0}")]
    NotFound(String),

    /// An id prefix matched more than one task.
    #[error("id prefix '{0}' matches more than one task")]
    AmbiguousId(String),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed data file: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn missing(field: &'static str) -> Self {
        Self::validation(field, "is required")
    }

    pub fn not_found(id: impl ToString) -> Self {
        Error::NotFound(id.to_string())
    }

    /// True for the validation class of errors (malformed input).
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. } | Error::AmbiguousId(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
