use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use stockroom_model::{Collection, Record};
use stockroom_types::EntityId;

use crate::Criteria;

/// Ordered ids matching a criteria, plus the total before paging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdSearchResult {
    total: usize,
    ids: Vec<EntityId>,
    criteria: Criteria,
}

impl IdSearchResult {
    pub fn new(total: usize, ids: Vec<EntityId>, criteria: Criteria) -> Self {
        Self {
            total,
            ids,
            criteria,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Aggregation values keyed by aggregation name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationResult {
    aggregations: BTreeMap<String, Value>,
    criteria: Criteria,
}

impl AggregationResult {
    pub fn new(aggregations: BTreeMap<String, Value>, criteria: Criteria) -> Self {
        Self {
            aggregations,
            criteria,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.aggregations.get(name)
    }

    pub fn aggregations(&self) -> &BTreeMap<String, Value> {
        &self.aggregations
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }
}

/// Entities found by a search, in search order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult<E> {
    total: usize,
    ids: Vec<EntityId>,
    entities: Collection<E>,
    aggregations: Option<AggregationResult>,
    criteria: Criteria,
}

impl<E: Record> SearchResult<E> {
    /// Bundles the pieces of a search. `entities` is reordered to follow the
    /// id search.
    pub fn from_results(
        ids: IdSearchResult,
        mut entities: Collection<E>,
        aggregations: Option<AggregationResult>,
    ) -> Self {
        entities.sort_by_ids(&ids.ids);
        Self {
            total: ids.total,
            ids: ids.ids,
            entities,
            aggregations,
            criteria: ids.criteria,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Ids returned by the id search, including any the reader omitted.
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn entities(&self) -> &Collection<E> {
        &self.entities
    }

    pub fn into_entities(self) -> Collection<E> {
        self.entities
    }

    pub fn aggregations(&self) -> Option<&AggregationResult> {
        self.aggregations.as_ref()
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }
}
