use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use stockroom_model::{AffectedRows, Entity, SchemaRegistry, WriteSchema};
use stockroom_repository::{
    AggregationResult, Criteria, EventDispatcher, EventListener, EventRecorder, IdSearchResult, ListenerError,
    RecordedEvent, RepositoryError, RepositoryEvent,
};
use stockroom_types::{EntityId, TranslationContext};

/// Appends its label to a shared log on every event.
struct Logger {
    label: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl EventListener for Logger {
    fn on_event(&self, _: &RepositoryEvent<'_>) -> Result<(), ListenerError> {
        self.log.lock().unwrap().push(self.label);
        Ok(())
    }
}

fn logger(label: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Arc<Logger> {
    Arc::new(Logger {
        label,
        log: log.clone(),
    })
}

fn failing(_: &RepositoryEvent<'_>) -> Result<(), ListenerError> {
    Err("rejected".into())
}

// ── Names ───────────────────────────────────────────────────────

#[test]
fn event_names_follow_entity_type() {
    let ctx = TranslationContext::default();
    let ids = IdSearchResult::new(0, Vec::new(), Criteria::new());
    let aggregations = AggregationResult::new(BTreeMap::new(), Criteria::new());

    let names: Vec<String> = [
        RepositoryEvent::BasicLoaded {
            entity_type: "product",
            entities: &[],
            context: &ctx,
        },
        RepositoryEvent::DetailLoaded {
            entity_type: "product",
            entities: &[],
            context: &ctx,
        },
        RepositoryEvent::IdSearchResultLoaded {
            entity_type: "product",
            result: &ids,
            context: &ctx,
        },
        RepositoryEvent::AggregationResultLoaded {
            entity_type: "product",
            result: &aggregations,
            context: &ctx,
        },
        RepositoryEvent::SearchResultLoaded {
            entity_type: "product",
            total: 0,
            ids: &[],
            aggregations: None,
            context: &ctx,
        },
    ]
    .iter()
    .map(RepositoryEvent::name)
    .collect();

    assert_eq!(
        names,
        vec![
            "product.basic.loaded",
            "product.detail.loaded",
            "product.id.search.result.loaded",
            "product.aggregation.result.loaded",
            "product.search.result.loaded",
        ]
    );
}

#[test]
fn written_event_is_named_entity_written() {
    let mut registry = SchemaRegistry::new();
    registry.register(WriteSchema::new("tax")).unwrap();
    let id = EntityId::new();
    let mut affected = AffectedRows::new();
    affected.insert("tax".into(), vec![json!({ "id": id }).as_object().unwrap().clone()]);
    let written = registry
        .written_event_for("tax", affected, &TranslationContext::default(), Vec::new())
        .unwrap();

    let event = RepositoryEvent::Written(&written);

    assert_eq!(event.name(), "entity.written");
    assert_eq!(event.entity_type(), "tax");
    assert_eq!(event.ids(), vec![id]);
}

// ── Dispatch ────────────────────────────────────────────────────

#[test]
fn listeners_run_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = EventDispatcher::new();
    dispatcher.subscribe_all(logger("first", &log));
    dispatcher.subscribe("tax.basic.loaded", logger("second", &log));
    dispatcher.subscribe_all(logger("third", &log));
    let ctx = TranslationContext::default();

    dispatcher
        .dispatch(&RepositoryEvent::BasicLoaded {
            entity_type: "tax",
            entities: &[],
            context: &ctx,
        })
        .unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
}

#[test]
fn named_subscription_ignores_other_events() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = EventDispatcher::new();
    dispatcher.subscribe("tax.detail.loaded", logger("detail", &log));
    let ctx = TranslationContext::default();

    dispatcher
        .dispatch(&RepositoryEvent::BasicLoaded {
            entity_type: "tax",
            entities: &[],
            context: &ctx,
        })
        .unwrap();

    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn first_listener_error_stops_delivery() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = EventDispatcher::new();
    dispatcher.subscribe_all(logger("before", &log));
    dispatcher.subscribe_all(Arc::new(failing));
    dispatcher.subscribe_all(logger("after", &log));
    let ctx = TranslationContext::default();

    let err = dispatcher
        .dispatch(&RepositoryEvent::BasicLoaded {
            entity_type: "tax",
            entities: &[],
            context: &ctx,
        })
        .unwrap_err();

    assert!(matches!(err, RepositoryError::Listener { ref event, .. } if event == "tax.basic.loaded"));
    assert_eq!(*log.lock().unwrap(), vec!["before"]);
}

#[test]
fn listener_may_subscribe_during_dispatch() {
    let dispatcher = Arc::new(EventDispatcher::new());
    let inner = dispatcher.clone();
    dispatcher.subscribe_all(Arc::new(move |_: &RepositoryEvent<'_>| -> Result<(), ListenerError> {
        inner.subscribe_all(Arc::new(EventRecorder::new()));
        Ok(())
    }));
    let ctx = TranslationContext::default();

    dispatcher
        .dispatch(&RepositoryEvent::BasicLoaded {
            entity_type: "tax",
            entities: &[],
            context: &ctx,
        })
        .unwrap();

    assert_eq!(dispatcher.listener_count(), 2);
}

// ── Recorder ────────────────────────────────────────────────────

#[test]
fn recorder_keeps_owned_events_until_drained() {
    let dispatcher = EventDispatcher::new();
    let recorder = EventRecorder::attach(&dispatcher);
    let id = EntityId::new();
    let entities = vec![Entity::new(id, "tax", json!({ "id": id }))];
    let ctx = TranslationContext::default();

    dispatcher
        .dispatch(&RepositoryEvent::BasicLoaded {
            entity_type: "tax",
            entities: &entities,
            context: &ctx,
        })
        .unwrap();
    drop(entities);

    assert_eq!(recorder.len(), 1);
    assert_eq!(
        recorder.drain(),
        vec![RecordedEvent {
            name: "tax.basic.loaded".into(),
            entity_type: "tax".into(),
            ids: vec![id],
        }]
    );
    assert!(recorder.is_empty());
}
