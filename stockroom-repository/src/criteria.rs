//! Search criteria.
//!
//! Repositories never look inside a [`Criteria`]; they hand it to the
//! searcher and aggregator, which decide how to execute it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filter, sort, page, and aggregation request. Built once, then only read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    #[serde(default)]
    filters: Vec<Filter>,
    #[serde(default)]
    sortings: Vec<Sorting>,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    aggregations: Vec<Aggregation>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn with_sorting(mut self, sorting: Sorting) -> Self {
        self.sortings.push(sorting);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregations.push(aggregation);
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn sortings(&self) -> &[Sorting] {
        &self.sortings
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn aggregations(&self) -> &[Aggregation] {
        &self.aggregations
    }

    pub fn has_aggregations(&self) -> bool {
        !self.aggregations.is_empty()
    }
}

/// A condition on one top-level property. All filters of a criteria must
/// match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Property equals `value`.
    Term { field: String, value: Value },
    /// Property equals any of `values`.
    Terms { field: String, values: Vec<Value> },
    /// Numeric property within the inclusive bounds.
    Range {
        field: String,
        #[serde(default)]
        gte: Option<f64>,
        #[serde(default)]
        lte: Option<f64>,
    },
}

impl Filter {
    pub fn term(field: &str, value: impl Into<Value>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms<V: Into<Value>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        Self::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn range(field: &str, gte: Option<f64>, lte: Option<f64>) -> Self {
        Self::Range {
            field: field.into(),
            gte,
            lte,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Self::Term { field, .. } | Self::Terms { field, .. } | Self::Range { field, .. } => field.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sorting {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl Sorting {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// A named aggregation over one property of all matching rows (ignoring
/// offset and limit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub name: String,
    pub field: String,
    pub kind: AggregationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    /// Rows where the property is present and not null.
    Count,
    Sum,
    Avg,
    Min,
    Max,
    /// Occurrences per distinct value.
    ValueCount,
}

impl Aggregation {
    pub fn new(name: &str, field: &str, kind: AggregationKind) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            kind,
        }
    }
}
