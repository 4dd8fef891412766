use serde_json::Value;
use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;
use stockroom_model::{
    AffectedRows, Collection, Entity, EntityDefinition, ModelError, Record, SchemaRegistry, WriteMode, WrittenEvent,
};
use stockroom_types::{EntityId, TranslationContext, WriteContext};
use tracing::{debug, warn};

use crate::{
    AggregationResult, Backends, Criteria, EventDispatcher, IdSearchResult, RepositoryEvent, RepositoryResult,
    SearchResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Projection {
    Basic,
    Detail,
}

/// Single entry point for reading, searching, aggregating, and writing one
/// entity type.
///
/// The repository owns no data and keeps no per-call state. Each operation
/// delegates to one strategy from its [`Backends`] and, on success, publishes
/// exactly one event on its [`EventDispatcher`].
pub struct EntityRepository<D: EntityDefinition> {
    schemas: Arc<SchemaRegistry>,
    backends: Backends,
    events: Arc<EventDispatcher>,
    _definition: PhantomData<fn() -> D>,
}

impl<D: EntityDefinition> EntityRepository<D> {
    /// Fails if `D::ENTITY_TYPE` has no registered write schema.
    pub fn new(
        schemas: Arc<SchemaRegistry>,
        backends: Backends,
        events: Arc<EventDispatcher>,
    ) -> RepositoryResult<Self> {
        if !schemas.contains(D::ENTITY_TYPE) {
            return Err(ModelError::UnknownEntityType(D::ENTITY_TYPE.to_string()).into());
        }
        Ok(Self {
            schemas,
            backends,
            events,
            _definition: PhantomData,
        })
    }

    pub fn entity_type(&self) -> &'static str {
        D::ENTITY_TYPE
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    /// Searches ids, loads their basic projections, and computes
    /// aggregations if `criteria` asks for any.
    ///
    /// Entities follow the id-search order. Ids the reader did not return are
    /// still listed in [`SearchResult::ids`].
    pub fn search(&self, criteria: &Criteria, context: &TranslationContext) -> RepositoryResult<SearchResult<D::Basic>> {
        let ids = self.search_ids(criteria, context)?;
        let entities = self.load::<D::Basic>(ids.ids(), context, Projection::Basic)?;
        let aggregations = if criteria.has_aggregations() {
            Some(self.aggregate(criteria, context)?)
        } else {
            None
        };

        let result = SearchResult::from_results(ids, entities, aggregations);
        self.events.dispatch(&RepositoryEvent::SearchResultLoaded {
            entity_type: D::ENTITY_TYPE,
            total: result.total(),
            ids: result.ids(),
            aggregations: result.aggregations(),
            context,
        })?;
        Ok(result)
    }

    pub fn search_ids(&self, criteria: &Criteria, context: &TranslationContext) -> RepositoryResult<IdSearchResult> {
        let result = self.backends.searcher.search(D::ENTITY_TYPE, criteria, context)?;
        debug!(
            "Searched {}: {} of {} ids",
            D::ENTITY_TYPE,
            result.ids().len(),
            result.total()
        );

        self.events.dispatch(&RepositoryEvent::IdSearchResultLoaded {
            entity_type: D::ENTITY_TYPE,
            result: &result,
            context,
        })?;
        Ok(result)
    }

    pub fn aggregate(&self, criteria: &Criteria, context: &TranslationContext) -> RepositoryResult<AggregationResult> {
        let result = self.backends.aggregator.aggregate(D::ENTITY_TYPE, criteria, context)?;
        debug!(
            "Aggregated {}: {} aggregation(s)",
            D::ENTITY_TYPE,
            result.aggregations().len()
        );

        self.events.dispatch(&RepositoryEvent::AggregationResultLoaded {
            entity_type: D::ENTITY_TYPE,
            result: &result,
            context,
        })?;
        Ok(result)
    }

    /// Loads basic projections. Unknown ids are omitted; a malformed id fails
    /// the whole call with `InvalidId`.
    pub fn read_basic<S: AsRef<str>>(
        &self,
        ids: &[S],
        context: &TranslationContext,
    ) -> RepositoryResult<Collection<D::Basic>> {
        let ids = EntityId::parse_all(ids)?;
        self.load(&ids, context, Projection::Basic)
    }

    /// Loads detail projections, sub-resources included.
    pub fn read_detail<S: AsRef<str>>(
        &self,
        ids: &[S],
        context: &TranslationContext,
    ) -> RepositoryResult<Collection<D::Detail>> {
        let ids = EntityId::parse_all(ids)?;
        self.load(&ids, context, Projection::Detail)
    }

    /// Inserts `payload` rows (with nested sub-resources). Fails with
    /// `Conflict` if any primary key already exists.
    pub fn create(&self, payload: &[Value], context: &TranslationContext) -> RepositoryResult<WrittenEvent> {
        self.write(WriteMode::Insert, payload, context)
    }

    /// Updates existing rows. Fails with `NotFound` if any primary key does
    /// not exist.
    pub fn update(&self, payload: &[Value], context: &TranslationContext) -> RepositoryResult<WrittenEvent> {
        self.write(WriteMode::Update, payload, context)
    }

    /// Inserts or updates per row.
    pub fn upsert(&self, payload: &[Value], context: &TranslationContext) -> RepositoryResult<WrittenEvent> {
        self.write(WriteMode::Upsert, payload, context)
    }

    fn load<R: Record>(
        &self,
        ids: &[EntityId],
        context: &TranslationContext,
        projection: Projection,
    ) -> RepositoryResult<Collection<R>> {
        let rows = if ids.is_empty() {
            Vec::new()
        } else {
            match projection {
                Projection::Basic => self.backends.reader.read_basic(D::ENTITY_TYPE, ids, context)?,
                Projection::Detail => self.backends.reader.read_detail(D::ENTITY_TYPE, ids, context)?,
            }
        };
        let rows = retain_requested(rows, ids);

        let records = rows
            .iter()
            .cloned()
            .map(Entity::into_record::<R>)
            .collect::<Result<Collection<R>, _>>()?;
        debug!(
            "Read {} {:?}: {} of {} requested",
            D::ENTITY_TYPE,
            projection,
            records.len(),
            ids.len()
        );

        let event = match projection {
            Projection::Basic => RepositoryEvent::BasicLoaded {
                entity_type: D::ENTITY_TYPE,
                entities: &rows,
                context,
            },
            Projection::Detail => RepositoryEvent::DetailLoaded {
                entity_type: D::ENTITY_TYPE,
                entities: &rows,
                context,
            },
        };
        self.events.dispatch(&event)?;
        Ok(records)
    }

    fn write(&self, mode: WriteMode, payload: &[Value], context: &TranslationContext) -> RepositoryResult<WrittenEvent> {
        let write_context = WriteContext::from_translation_context(context);
        let writer = &self.backends.writer;
        let affected: AffectedRows = match mode {
            WriteMode::Insert => writer.insert(D::ENTITY_TYPE, payload, &write_context)?,
            WriteMode::Update => writer.update(D::ENTITY_TYPE, payload, &write_context)?,
            WriteMode::Upsert => writer.upsert(D::ENTITY_TYPE, payload, &write_context)?,
        };
        debug!(
            "Wrote {} ({:?}): {} payload row(s), {} entity type(s) affected",
            D::ENTITY_TYPE,
            mode,
            payload.len(),
            affected.len()
        );

        let event = self
            .schemas
            .written_event_for(D::ENTITY_TYPE, affected, context, Vec::new())?;
        self.events.dispatch(&RepositoryEvent::Written(&event))?;
        Ok(event)
    }
}

impl<D: EntityDefinition> Clone for EntityRepository<D> {
    fn clone(&self) -> Self {
        Self {
            schemas: Arc::clone(&self.schemas),
            backends: self.backends.clone(),
            events: Arc::clone(&self.events),
            _definition: PhantomData,
        }
    }
}

impl<D: EntityDefinition> std::fmt::Debug for EntityRepository<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRepository")
            .field("entity_type", &D::ENTITY_TYPE)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// Drops rows a reader returned for ids that were not requested, and
/// duplicates of the same id.
fn retain_requested(rows: Vec<Entity>, ids: &[EntityId]) -> Vec<Entity> {
    let requested: HashSet<EntityId> = ids.iter().copied().collect();
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| {
            if !requested.contains(&row.id) {
                warn!("Reader returned unrequested {} {}", row.entity_type, row.id);
                return false;
            }
            seen.insert(row.id)
        })
        .collect()
}
