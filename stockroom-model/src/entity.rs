use serde::Serialize;
use serde::de::DeserializeOwned;
use stockroom_types::EntityId;

use crate::ModelResult;

/// A raw row handed back by a reader.
///
/// `data` is the full JSON object of the projection that was read, including
/// the primary key property. Repositories convert it into the typed
/// projection with [`Entity::into_record`].
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub entity_type: String,
    pub data: serde_json::Value,
}

impl Entity {
    pub fn new(id: EntityId, entity_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id,
            entity_type: entity_type.into(),
            data,
        }
    }

    /// Deserializes the row into a typed projection.
    pub fn into_record<R: Record>(self) -> ModelResult<R> {
        Ok(serde_json::from_value(self.data)?)
    }
}

/// A typed projection of one entity, keyed by a non-null id.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn id(&self) -> EntityId;
}

/// Binds an entity type identifier to its basic and detail projections.
///
/// The field table itself is configuration data registered in a
/// [`SchemaRegistry`](crate::SchemaRegistry) under [`Self::ENTITY_TYPE`].
pub trait EntityDefinition: Send + Sync + 'static {
    const ENTITY_TYPE: &'static str;

    /// Shallow projection: the entity's own fields.
    type Basic: Record;

    /// Deep projection: own fields plus expanded sub-resources.
    type Detail: Record;
}
