//! Error types for the model layer.

use crate::validation::Violation;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while loading schemas, decomposing payloads, or
/// converting raw rows into records.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No schema is registered for the entity type.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// A schema for the entity type was registered twice.
    #[error("schema already registered: {0}")]
    DuplicateSchema(String),

    /// A schema references something that does not exist, or declares no
    /// primary key.
    #[error("invalid schema {entity_type}: {reason}")]
    InvalidSchema { entity_type: String, reason: String },

    /// A write payload does not have the shape the schema describes.
    #[error("invalid payload for {entity_type}: {reason}")]
    InvalidPayload { entity_type: String, reason: String },

    /// One or more rows violate their schema.
    #[error("validation failed: {}", join_violations(.0))]
    Validation(Vec<Violation>),

    /// Schema configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ModelError {
    pub(crate) fn invalid_schema(entity_type: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            entity_type: entity_type.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_payload(entity_type: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            entity_type: entity_type.to_string(),
            reason: reason.into(),
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
