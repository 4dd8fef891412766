//! Generic entity repositories for Stockroom.
//!
//! An [`EntityRepository`] is the single entry point for one entity type. It
//! owns no data: every call is delegated to one of four injected strategies
//! ([`EntityReader`], [`EntityWriter`], [`EntitySearcher`],
//! [`EntityAggregator`]) and, once the strategy succeeds, exactly one
//! [`RepositoryEvent`] is published on the [`EventDispatcher`] handed to the
//! repository at construction.
//!
//! # Failure semantics
//!
//! - Strategy errors are returned unchanged; nothing is retried.
//! - No event is published when the strategy fails.
//! - A listener error is returned to the caller *after* the strategy already
//!   ran. A write is not rolled back when a listener fails.

mod criteria;
mod error;
mod event;
mod repository;
mod result;
mod strategy;

pub use criteria::{Aggregation, AggregationKind, Criteria, Filter, SortDirection, Sorting};
pub use error::{ListenerError, RepositoryError, RepositoryResult};
pub use event::{EventDispatcher, EventListener, EventRecorder, RecordedEvent, RepositoryEvent};
pub use repository::EntityRepository;
pub use result::{AggregationResult, IdSearchResult, SearchResult};
pub use strategy::{Backends, EntityAggregator, EntityReader, EntitySearcher, EntityWriter};
