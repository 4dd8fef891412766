//! Schema registry keyed by entity-type identifier.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use stockroom_types::TranslationContext;
use tracing::debug;

use crate::{AffectedRows, ModelError, ModelResult, WriteSchema, WrittenEvent};

/// All write schemas known to a process, keyed by entity type.
///
/// Schemas refer to each other by entity-type identifier only; the registry
/// resolves those references when decomposing payloads and building
/// written-event trees.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, WriteSchema>,
}

#[derive(Deserialize)]
struct SchemaFile {
    #[serde(default)]
    schema: Vec<WriteSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `[[schema]]` tables from TOML and verifies the result.
    pub fn from_toml(source: &str) -> ModelResult<Self> {
        let file: SchemaFile = toml::from_str(source)?;
        let mut registry = Self::new();
        for schema in file.schema {
            registry.register(schema)?;
        }
        registry.verify()?;
        debug!("Loaded {} write schemas", registry.len());
        Ok(registry)
    }

    /// Registers a schema. An empty write order defaults to the schema's own type.
    pub fn register(&mut self, mut schema: WriteSchema) -> ModelResult<()> {
        if self.schemas.contains_key(&schema.entity_type) {
            return Err(ModelError::DuplicateSchema(schema.entity_type));
        }
        if schema.write_order.is_empty() {
            schema.write_order.push(schema.entity_type.clone());
        }
        self.schemas.insert(schema.entity_type.clone(), schema);
        Ok(())
    }

    pub fn get(&self, entity_type: &str) -> ModelResult<&WriteSchema> {
        self.schemas
            .get(entity_type)
            .ok_or_else(|| ModelError::UnknownEntityType(entity_type.to_string()))
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.schemas.contains_key(entity_type)
    }

    /// Registered entity types, sorted.
    pub fn entity_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Write order declared by `entity_type`'s schema.
    pub fn write_order(&self, entity_type: &str) -> ModelResult<&[String]> {
        Ok(self.get(entity_type)?.write_order())
    }

    /// Checks cross-schema references.
    ///
    /// Every schema must declare a scalar primary key, every sub-resource
    /// target and write-order entry must be registered, and each write order
    /// must list the schema's own type. Taken together, the write orders
    /// must not contradict each other (no type both before and after
    /// another).
    pub fn verify(&self) -> ModelResult<()> {
        for entity_type in self.entity_types() {
            let schema = &self.schemas[entity_type];
            if schema.primary_key.is_empty() {
                return Err(ModelError::invalid_schema(entity_type, "no primary key"));
            }
            if let Some(pk) = schema.primary_key.iter().find(|f| f.is_subresource()) {
                return Err(ModelError::invalid_schema(
                    entity_type,
                    format!("primary key `{}` is a sub-resource", pk.property),
                ));
            }
            for (field, target) in schema.subresources() {
                if !self.contains(target) {
                    return Err(ModelError::invalid_schema(
                        entity_type,
                        format!("field `{}` references unknown type `{target}`", field.property),
                    ));
                }
            }
            for listed in schema.write_order() {
                if !self.contains(listed) {
                    return Err(ModelError::invalid_schema(
                        entity_type,
                        format!("write order lists unknown type `{listed}`"),
                    ));
                }
            }
            if !schema.write_order().iter().any(|t| t == entity_type) {
                return Err(ModelError::invalid_schema(
                    entity_type,
                    "write order does not list the type itself",
                ));
            }
        }
        self.verify_write_orders_acyclic()
    }

    fn verify_write_orders_acyclic(&self) -> ModelResult<()> {
        let mut edges: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for schema in self.schemas.values() {
            for pair in schema.write_order().windows(2) {
                edges.entry(pair[0].as_str()).or_default().insert(pair[1].as_str());
            }
        }

        let mut indegree: BTreeMap<&str, usize> = BTreeMap::new();
        for (from, targets) in &edges {
            indegree.entry(*from).or_default();
            for to in targets {
                *indegree.entry(*to).or_default() += 1;
            }
        }

        let mut ready: Vec<&str> = indegree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(t, _)| *t)
            .collect();
        while let Some(entity_type) = ready.pop() {
            for to in edges.get(entity_type).into_iter().flatten() {
                if let Some(degree) = indegree.get_mut(to) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(*to);
                    }
                }
            }
            indegree.remove(entity_type);
        }

        match indegree.keys().next() {
            None => Ok(()),
            Some(entity_type) => Err(ModelError::invalid_schema(
                entity_type,
                format!(
                    "write orders form a cycle through {}",
                    indegree.keys().copied().collect::<Vec<_>>().join(", ")
                ),
            )),
        }
    }

    /// Builds the written-event tree for `entity_type`.
    ///
    /// Takes `entity_type`'s own entry out of `updates`, then, for every other
    /// type in its write order with a non-empty entry left in `updates`,
    /// recursively builds that type's tree and nests it. Each nested call
    /// works on its own copy of the remaining rows, so a sub-resource shared
    /// by two branches shows up under both. Every call removes one non-empty
    /// entry before recursing, so the recursion ends even when schemas
    /// reference each other.
    pub fn create_written_event(
        &self,
        entity_type: &str,
        updates: &mut AffectedRows,
        context: &TranslationContext,
        errors: Vec<String>,
    ) -> ModelResult<WrittenEvent> {
        let schema = self.get(entity_type)?;
        let own = updates.remove(entity_type).unwrap_or_default();
        let mut event = WrittenEvent::new(
            entity_type,
            schema.primary_key_property(),
            own,
            context.clone(),
            errors,
        );

        for nested in schema.write_order() {
            if nested == entity_type {
                continue;
            }
            if updates.get(nested).is_some_and(|rows| !rows.is_empty()) {
                let mut remaining = updates.clone();
                event.add_event(self.create_written_event(nested, &mut remaining, context, Vec::new())?);
            }
        }

        Ok(event)
    }

    /// Wraps a writer's whole result into one tree rooted at `root`.
    ///
    /// Types the root's tree does not reach are attached to the root as
    /// additional nested events, so no affected row is dropped. Types without
    /// a registered schema become leaves keyed by `id`.
    pub fn written_event_for(
        &self,
        root: &str,
        mut affected: AffectedRows,
        context: &TranslationContext,
        errors: Vec<String>,
    ) -> ModelResult<WrittenEvent> {
        let mut event = self.create_written_event(root, &mut affected, context, errors)?;

        let orphans: Vec<String> = affected
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(entity_type, _)| entity_type.clone())
            .collect();

        for entity_type in orphans {
            // an earlier orphan's subtree may already cover this one
            if event.contains_type(&entity_type) {
                continue;
            }
            let nested = if self.contains(&entity_type) {
                let mut remaining = affected.clone();
                self.create_written_event(&entity_type, &mut remaining, context, Vec::new())?
            } else {
                let rows = affected.get(&entity_type).cloned().unwrap_or_default();
                WrittenEvent::new(entity_type.as_str(), "id", rows, context.clone(), Vec::new())
            };
            event.add_event(nested);
        }

        Ok(event)
    }
}
