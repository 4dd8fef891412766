use pretty_assertions::assert_eq;
use serde_json::json;
use stockroom_repository::{Aggregation, AggregationKind, Criteria, Filter, SortDirection, Sorting};

#[test]
fn builder_accumulates_parts() {
    let criteria = Criteria::new()
        .with_filter(Filter::term("active", true))
        .with_filter(Filter::range("price", Some(10.0), None))
        .with_sorting(Sorting::desc("price"))
        .with_offset(20)
        .with_limit(10)
        .with_aggregation(Aggregation::new("max_price", "price", AggregationKind::Max));

    assert_eq!(criteria.filters().len(), 2);
    assert_eq!(criteria.filters()[1].field(), "price");
    assert_eq!(criteria.sortings()[0].direction, SortDirection::Desc);
    assert_eq!(criteria.offset(), 20);
    assert_eq!(criteria.limit(), Some(10));
    assert!(criteria.has_aggregations());
}

#[test]
fn default_criteria_is_unbounded() {
    let criteria = Criteria::default();
    assert!(criteria.filters().is_empty());
    assert_eq!(criteria.offset(), 0);
    assert_eq!(criteria.limit(), None);
    assert!(!criteria.has_aggregations());
}

#[test]
fn criteria_deserializes_from_json_request() {
    let criteria: Criteria = serde_json::from_value(json!({
        "filters": [
            { "type": "terms", "field": "tax_id", "values": ["a", "b"] },
            { "type": "range", "field": "stock", "gte": 1.0 }
        ],
        "sortings": [{ "field": "name" }],
        "limit": 25,
        "aggregations": [{ "name": "stock", "field": "stock", "kind": "sum" }]
    }))
    .unwrap();

    assert_eq!(
        criteria,
        Criteria::new()
            .with_filter(Filter::terms("tax_id", ["a", "b"]))
            .with_filter(Filter::range("stock", Some(1.0), None))
            .with_sorting(Sorting::asc("name"))
            .with_limit(25)
            .with_aggregation(Aggregation::new("stock", "stock", AggregationKind::Sum))
    );
}
