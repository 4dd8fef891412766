//! Criteria evaluation over stored rows.

use serde_json::{Value, json};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use stockroom_model::Changeset;
use stockroom_repository::{
    Aggregation, AggregationKind, AggregationResult, Criteria, EntityAggregator, EntitySearcher, Filter,
    IdSearchResult, RepositoryResult, SortDirection,
};
use stockroom_types::{EntityId, TranslationContext};
use tracing::trace;

use crate::MemoryStore;

impl EntitySearcher for MemoryStore {
    fn search(
        &self,
        entity_type: &str,
        criteria: &Criteria,
        _context: &TranslationContext,
    ) -> RepositoryResult<IdSearchResult> {
        self.schemas().get(entity_type)?;
        let tables = self.read_tables();
        let mut matched: Vec<(&EntityId, &Changeset)> = tables
            .get(entity_type)
            .into_iter()
            .flatten()
            .filter(|(_, row)| criteria.filters().iter().all(|f| matches(f, row)))
            .collect();

        // stable: rows equal on every sorting keep primary-key order
        matched.sort_by(|(_, a), (_, b)| {
            criteria
                .sortings()
                .iter()
                .map(|sorting| {
                    let ordering = compare(a.get(&sorting.field), b.get(&sorting.field));
                    match sorting.direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        let total = matched.len();
        let ids: Vec<EntityId> = matched
            .into_iter()
            .skip(criteria.offset())
            .take(criteria.limit().unwrap_or(usize::MAX))
            .map(|(id, _)| *id)
            .collect();

        trace!("Search on {} matched {}, returning {}", entity_type, total, ids.len());
        Ok(IdSearchResult::new(total, ids, criteria.clone()))
    }
}

impl EntityAggregator for MemoryStore {
    fn aggregate(
        &self,
        entity_type: &str,
        criteria: &Criteria,
        _context: &TranslationContext,
    ) -> RepositoryResult<AggregationResult> {
        self.schemas().get(entity_type)?;
        let tables = self.read_tables();
        let matched: Vec<&Changeset> = tables
            .get(entity_type)
            .into_iter()
            .flat_map(|table| table.values())
            .filter(|row| criteria.filters().iter().all(|f| matches(f, row)))
            .collect();

        let aggregations = criteria
            .aggregations()
            .iter()
            .map(|aggregation| (aggregation.name.clone(), evaluate(aggregation, &matched)))
            .collect();

        trace!(
            "Aggregated {} over {} matching {} row(s)",
            criteria.aggregations().len(),
            matched.len(),
            entity_type
        );
        Ok(AggregationResult::new(aggregations, criteria.clone()))
    }
}

fn matches(filter: &Filter, row: &Changeset) -> bool {
    match filter {
        Filter::Term { field, value } => row.get(field) == Some(value),
        Filter::Terms { field, values } => row.get(field).is_some_and(|v| values.contains(v)),
        Filter::Range { field, gte, lte } => row.get(field).and_then(Value::as_f64).is_some_and(|n| {
            gte.is_none_or(|min| n >= min) && lte.is_none_or(|max| n <= max)
        }),
    }
}

/// Orders missing and null values first, then booleans, numbers, and
/// strings. Values of other kinds compare equal.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn evaluate(aggregation: &Aggregation, rows: &[&Changeset]) -> Value {
    let present: Vec<&Value> = rows
        .iter()
        .filter_map(|row| row.get(&aggregation.field))
        .filter(|v| !v.is_null())
        .collect();
    let numbers: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();

    match aggregation.kind {
        AggregationKind::Count => json!(present.len()),
        AggregationKind::Sum => json!(numbers.iter().sum::<f64>()),
        AggregationKind::Avg if numbers.is_empty() => Value::Null,
        AggregationKind::Avg => json!(numbers.iter().sum::<f64>() / numbers.len() as f64),
        AggregationKind::Min => numbers.iter().copied().reduce(f64::min).map_or(Value::Null, |n| json!(n)),
        AggregationKind::Max => numbers.iter().copied().reduce(f64::max).map_or(Value::Null, |n| json!(n)),
        AggregationKind::ValueCount => {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for value in present {
                let key = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                *counts.entry(key).or_default() += 1;
            }
            json!(counts)
        }
    }
}
