//! Row validation against a write schema.
//!
//! Runs ahead of write execution. A schema never validates on its own; the
//! writer calls [`validate_row`] for every decomposed row and rejects the
//! whole write if any row fails.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use stockroom_types::EntityId;

use crate::{Changeset, FieldDef, FieldKind, WriteSchema};

/// Conflict policy of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Fails if a row with the same primary key exists.
    Insert,
    /// Fails if no row with the primary key exists.
    Update,
    /// Inserts or updates per row.
    Upsert,
}

/// One schema constraint a row violates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub entity_type: String,
    pub property: String,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Required property absent or null.
    Missing,
    /// Property not declared by the schema.
    Unknown,
    /// Value has the wrong JSON type for the field kind.
    TypeMismatch { expected: &'static str },
    InvalidUuid,
    InvalidDate,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match &self.kind {
            ViolationKind::Missing => "is required".to_string(),
            ViolationKind::Unknown => "is not a known property".to_string(),
            ViolationKind::TypeMismatch { expected } => format!("must be {expected}"),
            ViolationKind::InvalidUuid => "is not a valid UUID".to_string(),
            ViolationKind::InvalidDate => "is not a valid date".to_string(),
        };
        write!(f, "{}.{} {}", self.entity_type, self.property, what)
    }
}

/// Validates one flat row (sub-resources already extracted).
///
/// `Insert` requires every required field; `Update` and `Upsert` only
/// require the primary key, since the row may be a partial change. The
/// primary key is always required, and a required field is never null.
pub fn validate_row(schema: &WriteSchema, row: &Changeset, mode: WriteMode) -> Vec<Violation> {
    let violation = |property: &str, kind| Violation {
        entity_type: schema.entity_type.clone(),
        property: property.to_string(),
        kind,
    };
    let mut violations = Vec::new();

    for field in schema.scalar_fields() {
        let non_null = field.required || schema.is_primary_key(&field.property);
        let must_exist = schema.is_primary_key(&field.property)
            || (field.required && mode == WriteMode::Insert);
        match row.get(&field.property) {
            None if must_exist => {
                violations.push(violation(&field.property, ViolationKind::Missing));
            }
            Some(Value::Null) if non_null => {
                violations.push(violation(&field.property, ViolationKind::Missing));
            }
            None | Some(Value::Null) => {}
            Some(value) => {
                if let Some(kind) = check_value(field, value) {
                    violations.push(violation(&field.property, kind));
                }
            }
        }
    }

    for property in row.keys() {
        if schema.field(property).is_none() {
            violations.push(violation(property, ViolationKind::Unknown));
        }
    }

    violations
}

fn check_value(field: &FieldDef, value: &Value) -> Option<ViolationKind> {
    let mismatch = |expected| Some(ViolationKind::TypeMismatch { expected });
    match &field.kind {
        FieldKind::Uuid => match value.as_str() {
            Some(raw) if EntityId::parse(raw).is_ok() => None,
            Some(_) => Some(ViolationKind::InvalidUuid),
            None => mismatch("a UUID string"),
        },
        FieldKind::String | FieldKind::LongText | FieldKind::LongTextWithHtml => {
            if value.is_string() { None } else { mismatch("a string") }
        }
        FieldKind::Bool => {
            if value.is_boolean() { None } else { mismatch("a boolean") }
        }
        FieldKind::Int => {
            if value.is_i64() { None } else { mismatch("an integer") }
        }
        FieldKind::Float => {
            if value.is_number() { None } else { mismatch("a number") }
        }
        FieldKind::Date => match value.as_str() {
            Some(raw) if is_date(raw) => None,
            Some(_) => Some(ViolationKind::InvalidDate),
            None => mismatch("a date string"),
        },
        FieldKind::Json | FieldKind::Subresource { .. } => None,
    }
}

fn is_date(raw: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(raw).is_ok()
        || chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").is_ok()
        || chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
}
