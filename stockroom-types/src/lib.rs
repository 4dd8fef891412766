//! Core type definitions for Stockroom.
//!
//! This crate defines the small, entity-agnostic types used throughout the
//! access layer:
//! - Entity identifiers (UUID, v7 when generated locally)
//! - The request-scoped translation context and the write context derived
//!   from it
//!
//! Entity structure (schemas, records, collections) belongs in
//! `stockroom-model`, not here.

mod context;
mod ids;

pub use context::{TranslationContext, WriteContext};
pub use ids::EntityId;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid language id: {0}")]
    InvalidLanguage(String),
}
