//! In-memory backend for Stockroom.
//!
//! [`MemoryStore`] implements all four repository strategies over plain
//! per-type tables of JSON rows:
//!
//! - Writes are decomposed into per-type rows, validated against their
//!   write schemas, conflict-checked, and then applied under a single lock,
//!   so a failing write leaves the store untouched.
//! - Detail reads expand sub-resources through their back-reference
//!   property.
//! - Searches evaluate [`Criteria`](stockroom_repository::Criteria) filters,
//!   sortings, and paging; aggregations run over all matching rows.

mod query;
mod store;

pub use store::MemoryStore;
