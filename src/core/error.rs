use thiserror::Error;

/// Errors that can occur while building, reconciling or persisting invoices.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReconcileError {
    /// Input failed a shape or range check. Never retryable.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Builder encountered invalid or missing configuration.
    #[error("builder error: {0}")]
    Builder(String),

    /// Configuration could not be parsed or is inconsistent.
    #[error("config error: {0}")]
    Config(String),

    /// Invoice number sequencing error.
    #[error("numbering error: {0}")]
    Numbering(String),

    /// Requested record does not exist in the store.
    #[error("not found: {0}")]
    NotFound(String),

    /// Opaque failure passed through from a storage or notification collaborator.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl ReconcileError {
    /// Whether the caller may retry the operation unchanged.
    ///
    /// Only collaborator failures flagged as retryable qualify; everything the
    /// engine itself rejects is deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(e) if e.retryable)
    }
}

/// Convenience alias used across the crate.
pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;

/// A single validation error with field path and reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Dot/bracket path to the invalid field (e.g. "line_items[2].quantity").
    pub field: String,
    /// Human-readable error description.
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Failure reported by a storage or notification collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("persistence error: {message}")]
pub struct PersistenceError {
    pub message: String,
    /// Set by the collaborator when a retry could succeed (timeouts, conflicts).
    pub retryable: bool,
}

impl PersistenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }
}
