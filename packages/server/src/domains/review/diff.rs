//! Diff engine - field-level changeset between a live snapshot and a draft
//! payload.
//!
//! Pure and deterministic: no storage access, no side effects. The draft
//! payload declares which fields it touches; the live entity is never
//! scanned for fields absent from the payload.

use serde::Serialize;
use serde_json::Value;

/// One changed field: the live value it replaces and the proposed value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEntry {
    pub field: String,
    /// None when the field is absent (or null) on the live entity.
    pub old_value: Option<Value>,
    pub new_value: Value,
}

/// Computes the ordered changeset between a live entity's fields and a draft
/// payload.
///
/// Iterates the payload's keys in the payload's own order. A field is
/// included only if its proposed value differs structurally from the live
/// value; absent and null are treated as the same "no value". Comparison is
/// shallow per field - a changed nested object is one replaced field, not a
/// recursive diff. The result is empty iff every payload field already
/// equals the corresponding live value.
pub fn compute_changeset(live_fields: &Value, payload: &Value) -> Vec<ChangeEntry> {
    let Some(proposed) = payload.as_object() else {
        return Vec::new();
    };
    let live = live_fields.as_object();

    let mut changes = Vec::new();
    for (field, new_value) in proposed {
        let old_value = live
            .and_then(|m| m.get(field))
            .filter(|v| !v.is_null())
            .cloned();
        let proposed_value = (!new_value.is_null()).then(|| new_value.clone());

        if old_value != proposed_value {
            changes.push(ChangeEntry {
                field: field.clone(),
                old_value,
                new_value: new_value.clone(),
            });
        }
    }
    changes
}

/// Presentation form of a field value for the admin review screen.
///
/// Formatting only - not part of the change-detection contract.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "—".to_string(),
        Some(Value::Bool(true)) => "yes".to_string(),
        Some(Value::Bool(false)) => "no".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Array(_) | Value::Object(_))) => {
            serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
        }
        Some(v) => v.to_string(),
    }
}

impl ChangeEntry {
    /// `old -> new` rendering for one row of the review screen.
    pub fn display(&self) -> (String, String) {
        (
            display_value(self.old_value.as_ref()),
            display_value(Some(&self.new_value)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_only_fields_that_differ() {
        let live = json!({ "name": "Acme Co", "category": "plumbing" });
        let payload = json!({ "name": "Acme", "category": "plumbing" });

        let changes = compute_changeset(&live, &payload);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "name");
        assert_eq!(changes[0].old_value, Some(json!("Acme Co")));
        assert_eq!(changes[0].new_value, json!("Acme"));
    }

    #[test]
    fn empty_when_payload_matches_live() {
        let live = json!({ "name": "Acme", "active": true });
        let payload = json!({ "name": "Acme", "active": true });
        assert!(compute_changeset(&live, &payload).is_empty());
    }

    #[test]
    fn never_scans_live_fields_absent_from_payload() {
        let live = json!({ "name": "Acme", "category": "plumbing", "location": "Duluth" });
        let payload = json!({ "name": "Acme Co" });

        let changes = compute_changeset(&live, &payload);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "name");
    }

    #[test]
    fn preserves_payload_key_order() {
        let live = json!({});
        let payload = json!({ "website": "https://acme.test", "name": "Acme", "bio": "b" });

        let fields: Vec<_> = compute_changeset(&live, &payload)
            .into_iter()
            .map(|c| c.field)
            .collect();
        assert_eq!(fields, vec!["website", "name", "bio"]);
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let live = json!({ "name": "Acme", "tags": ["a"] });
        let payload = json!({ "tags": ["a", "b"], "name": "Acme Co" });

        let first = compute_changeset(&live, &payload);
        let second = compute_changeset(&live, &payload);
        assert_eq!(first, second);
    }

    #[test]
    fn nested_change_is_one_replaced_field() {
        let live = json!({ "service_area": { "cities": ["Duluth"] } });
        let payload = json!({ "service_area": { "cities": ["Duluth", "Hibbing"] } });

        let changes = compute_changeset(&live, &payload);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "service_area");
        assert_eq!(
            changes[0].old_value,
            Some(json!({ "cities": ["Duluth"] }))
        );
    }

    #[test]
    fn absent_and_null_live_values_are_equivalent() {
        let live = json!({ "bio": null });
        let payload = json!({ "bio": null });
        assert!(compute_changeset(&live, &payload).is_empty());

        let payload = json!({ "bio": "hello" });
        let changes = compute_changeset(&live, &payload);
        assert_eq!(changes[0].old_value, None);
    }

    #[test]
    fn display_formatting() {
        assert_eq!(display_value(None), "—");
        assert_eq!(display_value(Some(&json!(null))), "—");
        assert_eq!(display_value(Some(&json!(true))), "yes");
        assert_eq!(display_value(Some(&json!(false))), "no");
        assert_eq!(display_value(Some(&json!("text"))), "text");
        assert_eq!(display_value(Some(&json!(12500))), "12500");
        assert!(display_value(Some(&json!({ "a": 1 }))).contains('\n'));
    }
}
