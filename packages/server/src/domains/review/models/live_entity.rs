//! Live marketplace records and the per-kind field constraints a draft
//! payload must satisfy before it may be applied.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::draft::EntityKind;
use crate::common::{LineageId, ReviewError};

/// LiveEntity - the currently published record for one lineage.
///
/// Logically owned by entity storage; the workflow only ever applies a
/// validated subset of fields to it, atomically with a draft transition.
/// Because payloads are applied at commit time, this always reflects the
/// most recently PUBLISHED version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveEntity {
    pub lineage_id: LineageId,
    pub entity_kind: EntityKind,
    /// Published field values as a JSON object.
    pub fields: Value,
    pub published_version: i32,
    pub updated_at: DateTime<Utc>,
}

/// Expected shape of one field on a live entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// String; must be non-empty when present (cannot be cleared)
    RequiredText,
    /// String, or null to clear
    Text,
    /// Boolean
    Flag,
    /// JSON number
    Number,
    /// Array or object, or null to clear
    Structured,
}

/// One allowed field on a live entity.
#[derive(Debug, Clone, Copy)]
pub struct FieldConstraint {
    pub name: &'static str,
    pub field_type: FieldType,
}

const SERVICE_FIELDS: &[FieldConstraint] = &[
    FieldConstraint { name: "name", field_type: FieldType::RequiredText },
    FieldConstraint { name: "description", field_type: FieldType::Text },
    FieldConstraint { name: "category", field_type: FieldType::Text },
    FieldConstraint { name: "price_cents", field_type: FieldType::Number },
    FieldConstraint { name: "active", field_type: FieldType::Flag },
    FieldConstraint { name: "location", field_type: FieldType::Text },
    FieldConstraint { name: "tags", field_type: FieldType::Structured },
];

const VENDOR_FIELDS: &[FieldConstraint] = &[
    FieldConstraint { name: "name", field_type: FieldType::RequiredText },
    FieldConstraint { name: "bio", field_type: FieldType::Text },
    FieldConstraint { name: "website", field_type: FieldType::Text },
    FieldConstraint { name: "phone", field_type: FieldType::Text },
    FieldConstraint { name: "email", field_type: FieldType::Text },
    FieldConstraint { name: "service_area", field_type: FieldType::Structured },
];

/// Allowed fields for one entity kind.
pub fn constraints_for(kind: EntityKind) -> &'static [FieldConstraint] {
    match kind {
        EntityKind::Service => SERVICE_FIELDS,
        EntityKind::Vendor => VENDOR_FIELDS,
    }
}

/// Validates a draft payload against the live-entity field constraints.
///
/// The payload must be a non-empty JSON object; every key must name a known
/// field of the entity kind and carry a value of the expected shape. Null
/// clears a field, except for required fields which can never be cleared.
pub fn validate_payload(kind: EntityKind, payload: &Value) -> Result<(), ReviewError> {
    let object = payload
        .as_object()
        .ok_or_else(|| ReviewError::Validation("payload must be a JSON object".to_string()))?;

    if object.is_empty() {
        return Err(ReviewError::Validation(
            "payload must propose at least one field change".to_string(),
        ));
    }

    for (key, value) in object {
        let constraint = constraints_for(kind)
            .iter()
            .find(|c| c.name == key)
            .ok_or_else(|| {
                ReviewError::Validation(format!("unknown {} field: {}", kind, key))
            })?;

        let ok = match constraint.field_type {
            FieldType::RequiredText => {
                value.as_str().is_some_and(|s| !s.trim().is_empty())
            }
            FieldType::Text => value.is_null() || value.is_string(),
            FieldType::Flag => value.is_boolean(),
            FieldType::Number => value.is_number(),
            FieldType::Structured => {
                value.is_null() || value.is_array() || value.is_object()
            }
        };

        if !ok {
            return Err(ReviewError::Validation(format!(
                "field {} has an invalid value for a {}",
                key, kind
            )));
        }
    }

    Ok(())
}
