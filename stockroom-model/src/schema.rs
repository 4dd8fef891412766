use serde::{Deserialize, Serialize};

/// Describes one entity type's persisted fields and write order.
///
/// A schema only describes structure. Validation of payloads against it lives
/// in [`crate::validation`], decomposition of nested payloads in
/// [`crate::WritePlan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteSchema {
    pub entity_type: String,
    pub primary_key: Vec<FieldDef>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Entity types in the order a payload rooted at this type is persisted.
    /// Declared by the schema author, never computed from the field graph.
    #[serde(default)]
    pub write_order: Vec<String>,
}

impl WriteSchema {
    /// Creates an empty schema whose write order is just its own type.
    pub fn new(entity_type: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        Self {
            write_order: vec![entity_type.clone()],
            entity_type,
            primary_key: Vec::new(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_primary_key(mut self, field: FieldDef) -> Self {
        self.primary_key.push(field);
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn with_write_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.write_order = order.into_iter().map(Into::into).collect();
        self
    }

    /// Looks up a primary-key or regular field by property name.
    pub fn field(&self, property: &str) -> Option<&FieldDef> {
        self.primary_key
            .iter()
            .chain(&self.fields)
            .find(|f| f.property == property)
    }

    /// Property that identifies a row of this type.
    pub fn primary_key_property(&self) -> &str {
        self.primary_key
            .first()
            .map(|f| f.property.as_str())
            .unwrap_or("id")
    }

    pub fn is_primary_key(&self, property: &str) -> bool {
        self.primary_key.iter().any(|f| f.property == property)
    }

    pub fn write_order(&self) -> &[String] {
        &self.write_order
    }

    /// Primary-key and scalar fields.
    pub fn scalar_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.primary_key
            .iter()
            .chain(&self.fields)
            .filter(|f| !f.is_subresource())
    }

    /// Sub-resource fields with their target entity type.
    pub fn subresources(&self) -> impl Iterator<Item = (&FieldDef, &str)> {
        self.fields
            .iter()
            .filter_map(|f| f.subresource_target().map(|target| (f, target)))
    }
}

/// A single property of a write schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub property: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
}

/// The primitive kind of a field, or a reference to another schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Uuid,
    String,
    LongText,
    LongTextWithHtml,
    Bool,
    Int,
    Float,
    Date,
    Json,
    /// Nested rows of another entity type, written in the same call.
    Subresource {
        entity_type: String,
        /// Property on the child that receives the parent's primary key.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        back_reference: Option<String>,
    },
}

impl FieldDef {
    fn simple(property: &str, kind: FieldKind) -> Self {
        Self {
            property: property.into(),
            kind,
            required: false,
        }
    }

    pub fn uuid(property: &str) -> Self {
        Self::simple(property, FieldKind::Uuid)
    }

    pub fn string(property: &str) -> Self {
        Self::simple(property, FieldKind::String)
    }

    pub fn long_text(property: &str) -> Self {
        Self::simple(property, FieldKind::LongText)
    }

    pub fn bool(property: &str) -> Self {
        Self::simple(property, FieldKind::Bool)
    }

    pub fn int(property: &str) -> Self {
        Self::simple(property, FieldKind::Int)
    }

    pub fn float(property: &str) -> Self {
        Self::simple(property, FieldKind::Float)
    }

    pub fn date(property: &str) -> Self {
        Self::simple(property, FieldKind::Date)
    }

    pub fn subresource(property: &str, entity_type: &str) -> Self {
        Self::simple(
            property,
            FieldKind::Subresource {
                entity_type: entity_type.into(),
                back_reference: None,
            },
        )
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the child property that receives the parent's primary key.
    /// No effect on non-subresource fields.
    #[must_use]
    pub fn with_back_reference(mut self, property: &str) -> Self {
        if let FieldKind::Subresource { back_reference, .. } = &mut self.kind {
            *back_reference = Some(property.into());
        }
        self
    }

    pub fn is_subresource(&self) -> bool {
        matches!(self.kind, FieldKind::Subresource { .. })
    }

    pub fn subresource_target(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Subresource { entity_type, .. } => Some(entity_type),
            _ => None,
        }
    }

    pub fn back_reference(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Subresource { back_reference, .. } => back_reference.as_deref(),
            _ => None,
        }
    }
}
