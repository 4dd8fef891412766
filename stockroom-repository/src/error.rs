//! Error types for repositories and their strategies.

use stockroom_model::{ModelError, Violation};
use thiserror::Error;

/// Result type for repository and strategy operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Error returned by an [`EventListener`](crate::EventListener).
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by repository calls.
///
/// Strategies report failures with these variants too; the repository passes
/// them through untouched.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No row with the primary key exists (update, or a read where existence
    /// is required).
    #[error("entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A row with the primary key already exists (create).
    #[error("entity already exists: {entity_type} {id}")]
    Conflict { entity_type: String, id: String },

    /// Rows violate their write schema.
    #[error("validation failed: {} violation(s)", .0.len())]
    Validation(Vec<Violation>),

    /// A caller-supplied id is not a valid UUID.
    #[error("invalid entity id: {0}")]
    InvalidId(String),

    /// Schema lookup, payload decomposition, or record conversion failed.
    #[error(transparent)]
    Model(ModelError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Opaque failure inside a strategy.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A listener rejected an event. The operation that produced the event
    /// has already completed.
    #[error("listener failed on {event}: {source}")]
    Listener {
        event: String,
        #[source]
        source: ListenerError,
    },
}

impl RepositoryError {
    pub fn not_found(entity_type: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub fn conflict(entity_type: &str, id: impl ToString) -> Self {
        Self::Conflict {
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(err.into())
    }
}

impl From<ModelError> for RepositoryError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation(violations) => Self::Validation(violations),
            other => Self::Model(other),
        }
    }
}

impl From<stockroom_types::Error> for RepositoryError {
    fn from(err: stockroom_types::Error) -> Self {
        match err {
            stockroom_types::Error::InvalidUuid(e) => Self::InvalidId(e.to_string()),
            other => Self::backend(other),
        }
    }
}
