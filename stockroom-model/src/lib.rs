//! Entity model for Stockroom.
//!
//! Defines the entity-agnostic types every repository and backend depends on:
//! - [`Entity`]: the raw row a backend hands back (id, type, JSON payload)
//! - [`Record`] / [`EntityDefinition`]: typed basic/detail projections of one entity type
//! - [`Collection`]: an ordered, id-unique sequence of records
//! - [`WriteSchema`] / [`SchemaRegistry`]: declarative field tables and write order
//! - [`WrittenEvent`]: the nested record of what a write changed
//! - [`WritePlan`]: decomposition of one nested payload into per-type rows
//!
//! Schemas are configuration data. The built-in ones live in [`catalog`].

pub mod catalog;
mod collection;
mod entity;
mod error;
mod plan;
mod registry;
mod schema;
pub mod validation;
mod written;

pub use collection::Collection;
pub use entity::{Entity, EntityDefinition, Record};
pub use error::{ModelError, ModelResult};
pub use plan::WritePlan;
pub use registry::SchemaRegistry;
pub use schema::{FieldDef, FieldKind, WriteSchema};
pub use validation::{Violation, ViolationKind, WriteMode};
pub use written::{AffectedRows, Changeset, WrittenEvent};
