//! Strategy seams a repository delegates to.
//!
//! Strategies are entity-agnostic: they receive the entity type name and
//! work on raw [`Entity`] rows and JSON payloads. The repository converts
//! rows into the typed projections of its [`EntityDefinition`].
//!
//! [`EntityDefinition`]: stockroom_model::EntityDefinition

use serde_json::Value;
use std::sync::Arc;
use stockroom_model::{AffectedRows, Entity};
use stockroom_types::{EntityId, TranslationContext, WriteContext};

use crate::{AggregationResult, Criteria, IdSearchResult, RepositoryResult};

/// Loads rows by id.
///
/// Implementations return only rows whose id was requested; unknown ids are
/// silently omitted. Row order is not significant.
pub trait EntityReader: Send + Sync {
    fn read_basic(
        &self,
        entity_type: &str,
        ids: &[EntityId],
        context: &TranslationContext,
    ) -> RepositoryResult<Vec<Entity>>;

    /// Like [`read_basic`](Self::read_basic), with sub-resources expanded
    /// into the row payload.
    fn read_detail(
        &self,
        entity_type: &str,
        ids: &[EntityId],
        context: &TranslationContext,
    ) -> RepositoryResult<Vec<Entity>>;
}

/// Persists nested payloads.
///
/// Each call is all-or-nothing: either every row of the payload (and of its
/// nested sub-resources) is written and reported in the returned
/// [`AffectedRows`], or nothing is written.
pub trait EntityWriter: Send + Sync {
    /// Fails with `Conflict` if any primary key already exists.
    fn insert(&self, entity_type: &str, payload: &[Value], context: &WriteContext) -> RepositoryResult<AffectedRows>;

    /// Fails with `NotFound` if any primary key does not exist.
    fn update(&self, entity_type: &str, payload: &[Value], context: &WriteContext) -> RepositoryResult<AffectedRows>;

    /// Inserts or updates per row.
    fn upsert(&self, entity_type: &str, payload: &[Value], context: &WriteContext) -> RepositoryResult<AffectedRows>;
}

/// Resolves criteria to an ordered page of ids.
pub trait EntitySearcher: Send + Sync {
    fn search(
        &self,
        entity_type: &str,
        criteria: &Criteria,
        context: &TranslationContext,
    ) -> RepositoryResult<IdSearchResult>;
}

/// Computes the aggregations named in criteria.
pub trait EntityAggregator: Send + Sync {
    fn aggregate(
        &self,
        entity_type: &str,
        criteria: &Criteria,
        context: &TranslationContext,
    ) -> RepositoryResult<AggregationResult>;
}

/// The four strategies a repository is built from.
#[derive(Clone)]
pub struct Backends {
    pub reader: Arc<dyn EntityReader>,
    pub writer: Arc<dyn EntityWriter>,
    pub searcher: Arc<dyn EntitySearcher>,
    pub aggregator: Arc<dyn EntityAggregator>,
}

impl Backends {
    pub fn new(
        reader: Arc<dyn EntityReader>,
        writer: Arc<dyn EntityWriter>,
        searcher: Arc<dyn EntitySearcher>,
        aggregator: Arc<dyn EntityAggregator>,
    ) -> Self {
        Self {
            reader,
            writer,
            searcher,
            aggregator,
        }
    }

    /// Uses one store for all four strategies.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: EntityReader + EntityWriter + EntitySearcher + EntityAggregator + 'static,
    {
        Self {
            reader: store.clone(),
            writer: store.clone(),
            searcher: store.clone(),
            aggregator: store,
        }
    }

    #[must_use]
    pub fn with_reader(mut self, reader: Arc<dyn EntityReader>) -> Self {
        self.reader = reader;
        self
    }

    #[must_use]
    pub fn with_writer(mut self, writer: Arc<dyn EntityWriter>) -> Self {
        self.writer = writer;
        self
    }

    #[must_use]
    pub fn with_searcher(mut self, searcher: Arc<dyn EntitySearcher>) -> Self {
        self.searcher = searcher;
        self
    }

    #[must_use]
    pub fn with_aggregator(mut self, aggregator: Arc<dyn EntityAggregator>) -> Self {
        self.aggregator = aggregator;
        self
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}
