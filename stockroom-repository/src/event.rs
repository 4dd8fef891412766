//! Repository events and their synchronous dispatch.

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use stockroom_model::{Entity, WrittenEvent};
use stockroom_types::{EntityId, TranslationContext};
use tracing::{debug, warn};

use crate::{AggregationResult, IdSearchResult, ListenerError, RepositoryError, RepositoryResult};

/// Name of the event published after every write, whatever the entity type.
pub(crate) const ENTITY_WRITTEN: &str = "entity.written";

/// Something a repository did, published once the delegated call succeeded.
///
/// Events borrow the data the repository is about to return; listeners that
/// need to keep anything must copy it.
#[derive(Debug, Clone, Copy)]
pub enum RepositoryEvent<'a> {
    BasicLoaded {
        entity_type: &'a str,
        entities: &'a [Entity],
        context: &'a TranslationContext,
    },
    DetailLoaded {
        entity_type: &'a str,
        entities: &'a [Entity],
        context: &'a TranslationContext,
    },
    IdSearchResultLoaded {
        entity_type: &'a str,
        result: &'a IdSearchResult,
        context: &'a TranslationContext,
    },
    AggregationResultLoaded {
        entity_type: &'a str,
        result: &'a AggregationResult,
        context: &'a TranslationContext,
    },
    SearchResultLoaded {
        entity_type: &'a str,
        total: usize,
        ids: &'a [EntityId],
        aggregations: Option<&'a AggregationResult>,
        context: &'a TranslationContext,
    },
    Written(&'a WrittenEvent),
}

impl RepositoryEvent<'_> {
    /// Event name, e.g. `product.basic.loaded` or `entity.written`.
    pub fn name(&self) -> String {
        match self {
            Self::BasicLoaded { entity_type, .. } => format!("{entity_type}.basic.loaded"),
            Self::DetailLoaded { entity_type, .. } => format!("{entity_type}.detail.loaded"),
            Self::IdSearchResultLoaded { entity_type, .. } => format!("{entity_type}.id.search.result.loaded"),
            Self::AggregationResultLoaded { entity_type, .. } => {
                format!("{entity_type}.aggregation.result.loaded")
            }
            Self::SearchResultLoaded { entity_type, .. } => format!("{entity_type}.search.result.loaded"),
            Self::Written(_) => ENTITY_WRITTEN.to_string(),
        }
    }

    /// Entity type the originating repository serves.
    pub fn entity_type(&self) -> &str {
        match self {
            Self::BasicLoaded { entity_type, .. }
            | Self::DetailLoaded { entity_type, .. }
            | Self::IdSearchResultLoaded { entity_type, .. }
            | Self::AggregationResultLoaded { entity_type, .. }
            | Self::SearchResultLoaded { entity_type, .. } => *entity_type,
            Self::Written(event) => event.entity_type(),
        }
    }

    /// Ids the event is about. For writes, the root node's ids.
    pub fn ids(&self) -> Vec<EntityId> {
        match self {
            Self::BasicLoaded { entities, .. } | Self::DetailLoaded { entities, .. } => {
                entities.iter().map(|e| e.id).collect()
            }
            Self::IdSearchResultLoaded { result, .. } => result.ids().to_vec(),
            Self::AggregationResultLoaded { .. } => Vec::new(),
            Self::SearchResultLoaded { ids, .. } => ids.to_vec(),
            Self::Written(event) => event.ids().to_vec(),
        }
    }

    pub fn context(&self) -> &TranslationContext {
        match self {
            Self::BasicLoaded { context, .. }
            | Self::DetailLoaded { context, .. }
            | Self::IdSearchResultLoaded { context, .. }
            | Self::AggregationResultLoaded { context, .. }
            | Self::SearchResultLoaded { context, .. } => *context,
            Self::Written(event) => event.context(),
        }
    }

    /// Whether a subscription to `name` receives this event.
    ///
    /// A written event also matches `<entity_type>.written` for every node of
    /// its tree.
    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Written(event) => {
                name == ENTITY_WRITTEN || event.flatten().iter().any(|node| node.name() == name)
            }
            other => other.name() == name,
        }
    }
}

/// Receives repository events.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &RepositoryEvent<'_>) -> Result<(), ListenerError>;
}

impl<F> EventListener for F
where
    F: Fn(&RepositoryEvent<'_>) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_event(&self, event: &RepositoryEvent<'_>) -> Result<(), ListenerError> {
        self(event)
    }
}

#[derive(Debug, Clone)]
enum Subscription {
    All,
    Named(String),
}

/// Delivers events to listeners synchronously, in registration order.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<Vec<(Subscription, Arc<dyn EventListener>)>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for events named `name`.
    pub fn subscribe(&self, name: impl Into<String>, listener: Arc<dyn EventListener>) {
        self.push(Subscription::Named(name.into()), listener);
    }

    /// Registers `listener` for every event.
    pub fn subscribe_all(&self, listener: Arc<dyn EventListener>) {
        self.push(Subscription::All, listener);
    }

    fn push(&self, subscription: Subscription, listener: Arc<dyn EventListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((subscription, listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Delivers `event` to every matching listener. Stops at the first
    /// listener error.
    pub fn dispatch(&self, event: &RepositoryEvent<'_>) -> RepositoryResult<()> {
        // snapshot so listeners may subscribe while being called
        let listeners: Vec<Arc<dyn EventListener>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(subscription, _)| match subscription {
                Subscription::All => true,
                Subscription::Named(name) => event.matches(name),
            })
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        let name = event.name();
        debug!("Dispatching {} to {} listener(s)", name, listeners.len());

        for listener in listeners {
            if let Err(source) = listener.on_event(event) {
                warn!("Listener failed on {}: {}", name, source);
                return Err(RepositoryError::Listener { event: name, source });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Owned summary of one delivered event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub name: String,
    pub entity_type: String,
    pub ids: Vec<EntityId>,
}

/// Listener that keeps every event it receives until drained.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<RecordedEvent>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder and subscribes it to everything on `dispatcher`.
    pub fn attach(dispatcher: &EventDispatcher) -> Arc<Self> {
        let recorder = Arc::new(Self::new());
        dispatcher.subscribe_all(recorder.clone());
        recorder
    }

    /// Takes all recorded events, oldest first.
    pub fn drain(&self) -> Vec<RecordedEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Names of the recorded events, without draining.
    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventListener for EventRecorder {
    fn on_event(&self, event: &RepositoryEvent<'_>) -> Result<(), ListenerError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedEvent {
                name: event.name(),
                entity_type: event.entity_type().to_string(),
                ids: event.ids(),
            });
        Ok(())
    }
}
