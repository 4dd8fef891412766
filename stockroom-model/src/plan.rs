//! Decomposition of one logical write into ordered per-type writes.

use serde_json::Value;
use std::collections::HashMap;
use stockroom_types::EntityId;
use tracing::trace;

use crate::{Changeset, FieldKind, ModelError, ModelResult, SchemaRegistry, WriteMode, WriteSchema};

/// Flat rows per entity type for one nested payload, plus the order in
/// which those types must be persisted.
#[derive(Debug, Clone, Default)]
pub struct WritePlan {
    root: String,
    /// Types in the order they were first seen while walking the payload.
    discovered: Vec<String>,
    rows: HashMap<String, Vec<Changeset>>,
    order: Vec<String>,
}

impl WritePlan {
    /// Splits `payload` (rows of `entity_type`, possibly with nested
    /// sub-resource rows) into flat rows per entity type.
    ///
    /// Rows without a primary key get a fresh id unless `mode` is
    /// [`WriteMode::Update`], where a missing key is left for validation to
    /// report. Sub-resource fields with a `back_reference` stamp the parent's
    /// primary key onto each child row.
    pub fn decompose(
        registry: &SchemaRegistry,
        entity_type: &str,
        payload: &[Value],
        mode: WriteMode,
    ) -> ModelResult<Self> {
        let schema = registry.get(entity_type)?;
        let mut plan = Self {
            root: entity_type.to_string(),
            order: schema.write_order().to_vec(),
            ..Self::default()
        };

        for value in payload {
            let row = as_row(entity_type, value)?;
            plan.add_row(registry, schema, row, mode)?;
        }

        trace!(
            "Decomposed {} payload rows of {} into {} types",
            payload.len(),
            entity_type,
            plan.discovered.len()
        );
        Ok(plan)
    }

    fn add_row(
        &mut self,
        registry: &SchemaRegistry,
        schema: &WriteSchema,
        mut row: Changeset,
        mode: WriteMode,
    ) -> ModelResult<()> {
        let pk = schema.primary_key_property();
        if !row.contains_key(pk) && mode != WriteMode::Update {
            if let Some(FieldKind::Uuid) = schema.field(pk).map(|f| &f.kind) {
                row.insert(pk.to_string(), Value::String(EntityId::new().to_string()));
            }
        }
        let parent_id = row.get(pk).cloned();
        if !self.discovered.contains(&schema.entity_type) {
            self.discovered.push(schema.entity_type.clone());
        }

        for (field, target) in schema.subresources() {
            let Some(nested) = row.remove(&field.property) else {
                continue;
            };
            let children = match nested {
                Value::Null => continue,
                Value::Array(items) => items,
                object @ Value::Object(_) => vec![object],
                _ => {
                    return Err(ModelError::invalid_payload(
                        &schema.entity_type,
                        format!("`{}` must be an object or an array of objects", field.property),
                    ));
                }
            };
            let child_schema = registry.get(target)?;
            for child in &children {
                let mut child_row = as_row(target, child)?;
                if let (Some(back_ref), Some(parent_id)) = (field.back_reference(), &parent_id) {
                    child_row.insert(back_ref.to_string(), parent_id.clone());
                }
                self.add_row(registry, child_schema, child_row, mode)?;
            }
        }

        self.rows.entry(schema.entity_type.clone()).or_default().push(row);
        Ok(())
    }

    /// Entity type the payload was rooted at.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn rows(&self, entity_type: &str) -> &[Changeset] {
        self.rows.get(entity_type).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Types with rows, in persistence order: the root's write order first,
    /// then any other type in discovery order.
    pub fn entity_types(&self) -> Vec<&str> {
        let listed = self
            .order
            .iter()
            .filter(|t| self.rows.contains_key(*t));
        let unlisted = self
            .discovered
            .iter()
            .filter(|t| !self.order.contains(*t));
        listed.chain(unlisted).map(String::as_str).collect()
    }

    /// Rows per type in persistence order.
    pub fn ordered(&self) -> Vec<(&str, &[Changeset])> {
        self.entity_types()
            .into_iter()
            .map(|t| (t, self.rows(t)))
            .collect()
    }

    /// Consumes the plan, yielding rows per type in persistence order.
    pub fn into_ordered(mut self) -> Vec<(String, Vec<Changeset>)> {
        let order: Vec<String> = self.entity_types().into_iter().map(str::to_string).collect();
        order
            .into_iter()
            .map(|t| {
                let rows = self.rows.remove(&t).unwrap_or_default();
                (t, rows)
            })
            .collect()
    }
}

fn as_row(entity_type: &str, value: &Value) -> ModelResult<Changeset> {
    value
        .as_object()
        .cloned()
        .ok_or_else(|| ModelError::invalid_payload(entity_type, "each row must be a JSON object"))
}
