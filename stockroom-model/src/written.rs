//! Written-event trees.

use serde::Serialize;
use std::collections::BTreeMap;
use stockroom_types::{EntityId, TranslationContext};

/// One affected row as reported by a writer: the primary key plus the
/// properties that were written.
pub type Changeset = serde_json::Map<String, serde_json::Value>;

/// Affected rows per entity type, as returned by a writer.
pub type AffectedRows = BTreeMap<String, Vec<Changeset>>;

/// Nested record of what one write changed.
///
/// The root node describes the entity type the write was issued against;
/// nested nodes describe the sub-resource types the same write touched.
/// Listeners can subscribe to any level by name (`<entity_type>.written`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrittenEvent {
    entity_type: String,
    ids: Vec<EntityId>,
    changesets: Vec<Changeset>,
    context: TranslationContext,
    errors: Vec<String>,
    events: Vec<WrittenEvent>,
}

impl WrittenEvent {
    /// Builds a node for `entity_type`, reading ids from `primary_key` in
    /// each changeset.
    pub fn new(
        entity_type: impl Into<String>,
        primary_key: &str,
        changesets: Vec<Changeset>,
        context: TranslationContext,
        errors: Vec<String>,
    ) -> Self {
        let ids = changesets
            .iter()
            .filter_map(|row| row.get(primary_key)?.as_str())
            .filter_map(|raw| EntityId::parse(raw).ok())
            .collect();
        Self {
            entity_type: entity_type.into(),
            ids,
            changesets,
            context,
            errors,
            events: Vec::new(),
        }
    }

    pub fn name(&self) -> String {
        format!("{}.written", self.entity_type)
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn changesets(&self) -> &[Changeset] {
        &self.changesets
    }

    pub fn context(&self) -> &TranslationContext {
        &self.context
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Directly nested events.
    pub fn events(&self) -> &[WrittenEvent] {
        &self.events
    }

    pub fn add_event(&mut self, event: WrittenEvent) {
        self.events.push(event);
    }

    /// First node for `entity_type` in depth-first order, this node included.
    pub fn find(&self, entity_type: &str) -> Option<&WrittenEvent> {
        if self.entity_type == entity_type {
            return Some(self);
        }
        self.events.iter().find_map(|e| e.find(entity_type))
    }

    pub fn contains_type(&self, entity_type: &str) -> bool {
        self.find(entity_type).is_some()
    }

    /// Every node of the tree, depth-first, parents before children.
    pub fn flatten(&self) -> Vec<&WrittenEvent> {
        let mut out = vec![self];
        for event in &self.events {
            out.extend(event.flatten());
        }
        out
    }
}
