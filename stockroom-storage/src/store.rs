use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use stockroom_model::validation::validate_row;
use stockroom_model::{AffectedRows, Changeset, Entity, SchemaRegistry, WriteMode, WritePlan, WriteSchema};
use stockroom_repository::{EntityReader, EntityWriter, RepositoryError, RepositoryResult};
use stockroom_types::{EntityId, TranslationContext, WriteContext};
use tracing::{debug, trace};

/// Rows of one entity type keyed by primary key.
pub(crate) type Table = BTreeMap<EntityId, Changeset>;

/// In-memory implementation of every repository strategy.
///
/// Rows are stored flat: sub-resource properties never live on the parent
/// row, they are separate rows in the target type's table pointing back at
/// the parent.
pub struct MemoryStore {
    schemas: Arc<SchemaRegistry>,
    tables: RwLock<HashMap<String, Table>>,
}

struct StagedRow {
    entity_type: String,
    id: EntityId,
    row: Changeset,
}

impl MemoryStore {
    pub fn new(schemas: Arc<SchemaRegistry>) -> Self {
        Self {
            schemas,
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Number of stored rows of `entity_type`.
    pub fn len(&self, entity_type: &str) -> usize {
        self.read_tables().get(entity_type).map_or(0, Table::len)
    }

    pub fn is_empty(&self) -> bool {
        self.read_tables().values().all(Table::is_empty)
    }

    /// Stored row, as last written.
    pub fn get(&self, entity_type: &str, id: EntityId) -> Option<Changeset> {
        self.read_tables().get(entity_type)?.get(&id).cloned()
    }

    pub(crate) fn read_tables(&self) -> RwLockReadGuard<'_, HashMap<String, Table>> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_tables(&self) -> RwLockWriteGuard<'_, HashMap<String, Table>> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, entity_type: &str, payload: &[Value], mode: WriteMode) -> RepositoryResult<AffectedRows> {
        let plan = WritePlan::decompose(&self.schemas, entity_type, payload, mode)?;
        let mut tables = self.write_tables();

        let staged = self.stage(&plan, &tables, mode)?;

        let mut affected = AffectedRows::new();
        for StagedRow { entity_type, id, row } in staged {
            let table = tables.entry(entity_type.clone()).or_default();
            table.entry(id).or_default().extend(row.clone());
            affected.entry(entity_type).or_default().push(row);
        }

        debug!(
            "Applied {:?} of {}: {}",
            mode,
            entity_type,
            affected
                .iter()
                .map(|(t, rows)| format!("{t}={}", rows.len()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(affected)
    }

    /// Validates and conflict-checks every row of `plan` without touching
    /// the tables.
    ///
    /// Validation errors take precedence: a `Conflict` or `NotFound` is only
    /// returned when every row is valid, and then for the first offending row.
    fn stage(&self, plan: &WritePlan, tables: &HashMap<String, Table>, mode: WriteMode) -> RepositoryResult<Vec<StagedRow>> {
        let mut staged = Vec::new();
        let mut violations = Vec::new();
        let mut key_error = None;

        for (entity_type, rows) in plan.ordered() {
            let schema = self.schemas.get(entity_type)?;
            let pk = schema.primary_key_property();
            let table = tables.get(entity_type);
            let mut seen = HashSet::new();

            for row in rows {
                let id = row_id(row, pk);
                let stored = id.is_some_and(|id| table.is_some_and(|t| t.contains_key(&id)));
                let repeated = id.is_some_and(|id| seen.contains(&id));
                let row_mode = resolve_mode(mode, stored || repeated);

                let row_violations = validate_row(schema, row, row_mode);
                if !row_violations.is_empty() {
                    violations.extend(row_violations);
                    continue;
                }
                // a valid row always carries a parseable primary key
                let Some(id) = id else { continue };
                seen.insert(id);

                let error = match row_mode {
                    WriteMode::Insert if stored || repeated => Some(RepositoryError::conflict(entity_type, id)),
                    WriteMode::Update if !stored && !repeated => Some(RepositoryError::not_found(entity_type, id)),
                    _ => None,
                };
                if let Some(error) = error {
                    key_error.get_or_insert(error);
                    continue;
                }

                trace!("Staged {:?} of {} {}", row_mode, entity_type, id);
                staged.push(StagedRow {
                    entity_type: entity_type.to_string(),
                    id,
                    row: row.clone(),
                });
            }
        }

        if !violations.is_empty() {
            return Err(RepositoryError::Validation(violations));
        }
        match key_error {
            Some(error) => Err(error),
            None => Ok(staged),
        }
    }

    fn load(&self, entity_type: &str, ids: &[EntityId], detail: bool) -> RepositoryResult<Vec<Entity>> {
        let schema = self.schemas.get(entity_type)?;
        let tables = self.read_tables();
        let Some(table) = tables.get(entity_type) else {
            return Ok(Vec::new());
        };

        let mut entities = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(row) = table.get(id) else { continue };
            let mut data = row.clone();
            if detail {
                expand_subresources(schema, *id, &tables, &mut data);
            }
            entities.push(Entity::new(*id, entity_type, Value::Object(data)));
        }

        trace!(
            "Loaded {} of {} {} row(s) (detail: {})",
            entities.len(),
            ids.len(),
            entity_type,
            detail
        );
        Ok(entities)
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.read_tables();
        let mut counts: Vec<(&String, usize)> = tables.iter().map(|(t, rows)| (t, rows.len())).collect();
        counts.sort();
        f.debug_struct("MemoryStore").field("tables", &counts).finish()
    }
}

impl EntityReader for MemoryStore {
    fn read_basic(
        &self,
        entity_type: &str,
        ids: &[EntityId],
        _context: &TranslationContext,
    ) -> RepositoryResult<Vec<Entity>> {
        self.load(entity_type, ids, false)
    }

    fn read_detail(
        &self,
        entity_type: &str,
        ids: &[EntityId],
        _context: &TranslationContext,
    ) -> RepositoryResult<Vec<Entity>> {
        self.load(entity_type, ids, true)
    }
}

impl EntityWriter for MemoryStore {
    fn insert(&self, entity_type: &str, payload: &[Value], _context: &WriteContext) -> RepositoryResult<AffectedRows> {
        self.write(entity_type, payload, WriteMode::Insert)
    }

    fn update(&self, entity_type: &str, payload: &[Value], _context: &WriteContext) -> RepositoryResult<AffectedRows> {
        self.write(entity_type, payload, WriteMode::Update)
    }

    fn upsert(&self, entity_type: &str, payload: &[Value], _context: &WriteContext) -> RepositoryResult<AffectedRows> {
        self.write(entity_type, payload, WriteMode::Upsert)
    }
}

fn row_id(row: &Changeset, primary_key: &str) -> Option<EntityId> {
    row.get(primary_key)
        .and_then(Value::as_str)
        .and_then(|raw| EntityId::parse(raw).ok())
}

fn resolve_mode(mode: WriteMode, exists: bool) -> WriteMode {
    match mode {
        WriteMode::Upsert if exists => WriteMode::Update,
        WriteMode::Upsert => WriteMode::Insert,
        other => other,
    }
}

/// Adds one array per sub-resource field, holding the target rows whose
/// back reference points at `id`. Fields without a back reference expand to
/// an empty array.
fn expand_subresources(schema: &WriteSchema, id: EntityId, tables: &HashMap<String, Table>, data: &mut Changeset) {
    for (field, target) in schema.subresources() {
        let children: Vec<Value> = match (field.back_reference(), tables.get(target)) {
            (Some(back_reference), Some(table)) => table
                .values()
                .filter(|child| row_id(child, back_reference) == Some(id))
                .cloned()
                .map(Value::Object)
                .collect(),
            _ => Vec::new(),
        };
        data.insert(field.property.clone(), Value::Array(children));
    }
}
